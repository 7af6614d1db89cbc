#![cfg(not(target_arch = "wasm32"))]

use anyhow::Result;
use futures_util::TryStreamExt;
use s3_client::Client;

/// Starts a multipart upload and prints a presigned URL for each part.
///
/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `S3_ENDPOINT`,
/// `S3_REGION`, `BUCKET_NAME` and `OBJECT_KEY` from the environment.
#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let bucket = std::env::var("BUCKET_NAME")?;
    let key = std::env::var("OBJECT_KEY")?;
    let parts: u16 = std::env::var("PART_COUNT")
        .ok()
        .and_then(|count| count.parse().ok())
        .unwrap_or(3);

    let client = Client::from_env()?;
    let upload_id = client.initiate_upload(&bucket, &key, &[], None).await?;
    println!("upload id: {}", upload_id);

    for number in 1..=parts {
        let url = client.presigned_upload_part_url(&bucket, &key, &upload_id, number, 3600, None)?;
        println!("PUT part {}: {}", number, url);
    }

    let stored: Vec<_> = client.list_parts(&bucket, &key, &upload_id).try_collect().await?;
    println!("{} parts stored so far", stored.len());

    if std::env::var("ABORT").is_ok() {
        client.abort_upload(&bucket, &key, &upload_id).await?;
        println!("aborted");
    }

    Ok(())
}
