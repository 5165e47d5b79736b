//! Export encrypted push records for cross-implementation verification.
//!
//! Records are addressed to the RFC 8291 appendix A receiver, whose
//! private key is public, so any implementation can decrypt them. Each
//! file holds one base64url record. Set `RUST_LOG=webpush=debug` to see
//! record sizes.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;
use webpush::{Aes128GcmEncoder, WebPushEncoder};

const RECEIVER_PUBLIC: &str =
    "BCVxsr7N_eNgVRqvHtD0zTZsEc6-VV-JvLexhqUzORcxaOzi6-AYWXvTBHm4bjyPjs7Vd8pZGH6SRpkNtoIAiw4";
const AUTH: &str = "BTBZMqHH6r4Tts7J_aSIgg";

fn test_messages() -> BTreeMap<&'static str, String> {
    let mut messages = BTreeMap::new();
    messages.insert("empty", String::new());
    messages.insert("single_char", "X".to_string());
    messages.insert("newlines", "Line 1\nLine 2\nLine 3".to_string());
    messages.insert("emoji", "Hello 👋 World 🌍".to_string());
    messages.insert("chinese", "你好世界 - Hello World".to_string());
    messages.insert(
        "notification",
        r#"{"title":"New message","body":"You have 3 unread messages","badge":3}"#.to_string(),
    );
    messages.insert("block_aligned", "B".repeat(127));
    messages.insert(
        "long_text",
        "The quick brown fox jumps over the lazy dog. ".repeat(40),
    );
    messages.insert("max_payload", "A".repeat(webpush::MAX_PAYLOAD_SIZE));
    messages
}

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let output_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test-records-rust".to_string());
    let output_path = Path::new(&output_dir);
    fs::create_dir_all(output_path)?;

    let encoder = Aes128GcmEncoder::new();
    let messages = test_messages();

    for (key, message) in &messages {
        let record = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, message.as_bytes())?;
        fs::write(
            output_path.join(format!("{}.b64", key)),
            webpush::encode_base64url(&record),
        )?;
        println!("✓ {} ({} bytes)", key, record.len());
    }

    println!(
        "Rust: exported {} records to {}",
        messages.len(),
        output_dir
    );
    Ok(())
}
