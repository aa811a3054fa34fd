//! Sends a generated 500x500 test pattern as JPEG to a listening peer.
//!
//! Run with:
//!   cargo run --features cli -- listen --port 5001 --kind image --count 1
//!
//! In another terminal:
//!   cargo run --example image-client

use std::time::Duration;

use ezsocket::frame::image::{DynamicImage, Rgb, RgbImage};
use ezsocket::frame::JpegCodec;
use ezsocket::peer::{connect_with_config, ConnectionConfig};
use ezsocket::transport::RetryPolicy;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConnectionConfig::client("127.0.0.1", 5001)
        .with_retry(RetryPolicy::every(Duration::from_millis(500)).with_max_attempts(20));
    let mut conn = connect_with_config(&config)?;

    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(500, 500, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    conn.send_image(&JpegCodec::default(), &img)?;
    eprintln!("Sent 500x500 image in packets of {} bytes", conn.packet_size());

    conn.disconnect()?;
    Ok(())
}
