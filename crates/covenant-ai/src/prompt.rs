use covenant_core::{Contract, Document};

const NOT_SPECIFIED: &str = "Not specified";

/// Response schema appended to every analysis prompt.
const RESPONSE_SCHEMA: &str = r#"Please provide your analysis in the following JSON format:
{
  "summary": "A comprehensive summary of the contract (2-3 paragraphs)",
  "keyTerms": [
    {"term": "Term Name", "value": "Term Value", "confidence": 95}
  ],
  "risks": [
    {
      "type": "High|Medium|Low",
      "title": "Risk Title",
      "description": "Detailed risk description",
      "clause": "Referenced clause",
      "recommendation": "Suggested action"
    }
  ],
  "obligations": [
    {
      "party": "Party Name",
      "obligation": "Obligation description",
      "deadline": "Deadline or timeframe",
      "status": "active|completed|pending"
    }
  ],
  "clauses": [
    {
      "category": "Clause Category",
      "status": "standard|review|non-standard",
      "text": "Clause summary"
    }
  ],
  "confidence": 85
}"#;

/// Render the analysis request for one contract document.
pub fn build_prompt(contract: &Contract, document: &Document) -> String {
    let value = contract
        .formatted_value()
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let start = contract
        .start_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let expiry = contract
        .expiry_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let description = contract
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("Not provided");

    format!(
        "Analyze the following contract and provide a comprehensive assessment:\n\
         \n\
         Contract Name: {name}\n\
         Party: {party}\n\
         Type: {kind}\n\
         Value: {value}\n\
         Start Date: {start}\n\
         Expiry Date: {expiry}\n\
         Description: {description}\n\
         Document: {file} (version {version})\n\
         \n\
         {RESPONSE_SCHEMA}",
        name = contract.name,
        party = contract.party_name,
        kind = contract.contract_type,
        file = document.original_name,
        version = document.version,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use covenant_core::{ContractType, NewDocument};
    use uuid::Uuid;

    use super::*;

    fn document_for(contract: &Contract, version: u32) -> Document {
        NewDocument {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            storage_handle: "a.pdf".into(),
            original_name: "msa-final.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 10,
            checksum: "00".into(),
            uploaded_by: Uuid::new_v4(),
        }
        .into_latest(version, Utc::now())
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let contract = Contract::new("Acme MSA", "Acme Corp", ContractType::ServiceAgreement);
        let prompt = build_prompt(&contract, &document_for(&contract, 1));

        assert!(prompt.starts_with("Analyze the following contract"));
        assert!(prompt.contains("Contract Name: Acme MSA\n"));
        assert!(prompt.contains("Party: Acme Corp\n"));
        assert!(prompt.contains("Type: SERVICE_AGREEMENT\n"));
        assert!(prompt.contains("Value: Not specified\n"));
        assert!(prompt.contains("Start Date: Not specified\n"));
        assert!(prompt.contains("Expiry Date: Not specified\n"));
        assert!(prompt.contains("Description: Not provided\n"));
        assert!(prompt.contains("Document: msa-final.pdf (version 1)\n"));
        assert!(prompt.ends_with("\"confidence\": 85\n}"));
    }

    #[test]
    fn populated_fields_are_embedded() {
        let mut contract = Contract::new("Lease", "Landlord Ltd", ContractType::RealEstate);
        contract.value = Some(125000.5);
        contract.currency = "EUR".into();
        contract.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        contract.expiry_date = NaiveDate::from_ymd_opt(2026, 12, 31);
        contract.description = Some("Office lease, floor 3".into());

        let prompt = build_prompt(&contract, &document_for(&contract, 4));
        assert!(prompt.contains("Value: EUR 125000.5\n"));
        assert!(prompt.contains("Start Date: 2024-01-01\n"));
        assert!(prompt.contains("Expiry Date: 2026-12-31\n"));
        assert!(prompt.contains("Description: Office lease, floor 3\n"));
        assert!(prompt.contains("(version 4)"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let contract = Contract::new("NDA", "Beta", ContractType::Nda);
        let doc = document_for(&contract, 2);
        assert_eq!(build_prompt(&contract, &doc), build_prompt(&contract, &doc));
    }
}
