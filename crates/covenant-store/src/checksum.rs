//! Streaming SHA-256 over any async byte source.

use ring::digest::{Context, SHA256};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK: usize = 64 * 1024;

/// Content digest plus the number of bytes hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Lowercase hex SHA-256.
    pub hex: String,
    pub size: u64,
}

/// Hash a stream in fixed-size chunks; memory use does not depend on input size.
pub async fn sha256_reader<R>(mut reader: R) -> std::io::Result<Digest>
where
    R: AsyncRead + Unpin,
{
    let mut ctx = Context::new(&SHA256);
    let mut buf = vec![0u8; CHUNK];
    let mut size = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        ctx.update(&buf[..n]);
        size += n as u64;
    }
    Ok(Digest {
        hex: hex::encode(ctx.finish()),
        size,
    })
}
