//! Vertical card and table rendering for contracts, documents and jobs.

use std::fmt::Write as _;

use covenant_core::{AnalysisJob, AnalysisResult, Contract, Document};

const MAX_LIST_ITEMS: usize = 10;
const MAX_TEXT: usize = 80;

// ── Public API ──

pub fn contract_card(c: &Contract) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", c.name);
    let _ = writeln!(out);
    field(&mut out, "id", c.id);
    field(&mut out, "party", &c.party_name);
    field(&mut out, "type", c.contract_type);
    if let Some(v) = c.formatted_value() {
        field(&mut out, "value", v);
    }
    if let Some(d) = c.start_date {
        field(&mut out, "start_date", d);
    }
    if let Some(d) = c.expiry_date {
        field(&mut out, "expiry_date", d);
    }
    if let Some(d) = &c.description {
        field(&mut out, "description", d);
    }
    field(&mut out, "created_at", c.created_at.to_rfc3339());
    out
}

pub fn document_card(d: &Document) -> String {
    let mut out = String::new();
    let latest = if d.is_latest { "  (latest)" } else { "" };
    let _ = writeln!(out, "=== {} v{}{} ===", d.original_name, d.version, latest);
    let _ = writeln!(out);
    field(&mut out, "id", d.id);
    field(&mut out, "contract_id", d.contract_id);
    field(&mut out, "mime_type", &d.mime_type);
    field(&mut out, "size", human_size(d.size));
    field(&mut out, "sha256", &d.checksum);
    field(&mut out, "storage_handle", &d.storage_handle);
    field(&mut out, "uploaded_by", d.uploaded_by);
    field(&mut out, "created_at", d.created_at.to_rfc3339());
    out
}

/// One line per version, newest first.
pub fn document_table(docs: &[Document]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:>4}  {:<1}  {:<36}  {:>10}  {:<32}",
        "ver", "*", "id", "size", "file"
    );
    for d in docs {
        let _ = writeln!(
            out,
            "  {:>4}  {:<1}  {:<36}  {:>10}  {:<32}",
            d.version,
            if d.is_latest { "*" } else { "" },
            d.id,
            human_size(d.size),
            truncate(&d.original_name, 32),
        );
    }
    out
}

pub fn job_card(j: &AnalysisJob) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Analysis {} ===", j.id);
    let _ = writeln!(out);

    section(&mut out, "Job");
    field(&mut out, "status", j.status);
    field(&mut out, "kind", j.kind);
    field(&mut out, "contract_id", j.contract_id);
    field(&mut out, "document_id", j.document_id);
    field(&mut out, "requested_by", j.requested_by);
    field(&mut out, "model", &j.model);
    if let Some(ms) = j.processing_ms {
        field(&mut out, "processing_ms", ms);
    }
    field(&mut out, "created_at", j.created_at.to_rfc3339());
    if let Some(at) = j.completed_at {
        field(&mut out, "completed_at", at.to_rfc3339());
    }
    if let Some(e) = &j.error {
        field(&mut out, "error", e);
    }
    let _ = writeln!(out);

    if let Some(result) = &j.result {
        result_sections(&mut out, result);
    }
    out
}

/// One line per job, newest first.
pub fn job_table(jobs: &[AnalysisJob]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<36}  {:<10}  {:<22}  {:>8}  {}",
        "id", "status", "kind", "ms", "created"
    );
    for j in jobs {
        let ms = j.processing_ms.map(|m| m.to_string()).unwrap_or_else(|| "-".into());
        let _ = writeln!(
            out,
            "  {:<36}  {:<10}  {:<22}  {:>8}  {}",
            j.id,
            j.status,
            j.kind,
            ms,
            j.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    out
}

// ── Result rendering ──

fn result_sections(out: &mut String, r: &AnalysisResult) {
    section(out, "Summary");
    let _ = writeln!(out, "  {}", r.summary);
    field(out, "confidence", format!("{}%", r.confidence));
    let _ = writeln!(out);

    if !r.key_terms.is_empty() {
        let _ = writeln!(out, "Key Terms ({}):", r.key_terms.len());
        for t in r.key_terms.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(out, "    {:<24} {}  ({}%)", t.term, truncate(&t.value, 48), t.confidence);
        }
        more(out, r.key_terms.len());
        let _ = writeln!(out);
    }

    if !r.risks.is_empty() {
        let _ = writeln!(out, "Risks ({}):", r.risks.len());
        for risk in r.risks.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(out, "    [{:?}] {}", risk.severity, risk.title);
            if !risk.clause.is_empty() {
                let _ = writeln!(out, "      clause: {}", risk.clause);
            }
            if !risk.recommendation.is_empty() {
                let _ = writeln!(out, "      → {}", truncate(&risk.recommendation, MAX_TEXT));
            }
        }
        more(out, r.risks.len());
        let _ = writeln!(out);
    }

    if !r.obligations.is_empty() {
        let _ = writeln!(out, "Obligations ({}):", r.obligations.len());
        for o in r.obligations.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(out, "    {:<20} {}", o.party, truncate(&o.description, MAX_TEXT));
            if !o.deadline.is_empty() {
                let _ = writeln!(out, "      deadline: {}  status: {:?}", o.deadline, o.status);
            }
        }
        more(out, r.obligations.len());
        let _ = writeln!(out);
    }

    if !r.clause_assessments.is_empty() {
        let _ = writeln!(out, "Clauses ({}):", r.clause_assessments.len());
        for c in r.clause_assessments.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(out, "    {:<24} {:?}", c.category, c.status);
            if !c.text.is_empty() {
                let _ = writeln!(out, "      {}", truncate(&c.text, MAX_TEXT));
            }
        }
        more(out, r.clause_assessments.len());
        let _ = writeln!(out);
    }
}

// ── Helpers ──

fn section(out: &mut String, header: &str) {
    let _ = writeln!(out, "{header}");
}

fn field(out: &mut String, name: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<26} {}", name, value);
}

fn more(out: &mut String, len: usize) {
    if len > MAX_LIST_ITEMS {
        let _ = writeln!(out, "    ... and {} more", len - MAX_LIST_ITEMS);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
