use std::env;

use studiogen::{
    logger, variants, AspectRatio, GenerationConfig, ImageGenerationRequest, StudioClient,
    StudioConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    logger::init()?;

    let source = env::var("STUDIO_SOURCE_URL")?;
    let client = StudioClient::new(StudioConfig::from_env())?;

    let config = GenerationConfig {
        preserve_product_label: true,
        preserve_pose: true,
        ..GenerationConfig::default()
    };
    let request = ImageGenerationRequest::new(source.as_str(), config)
        .with_context("minimalist concrete rooftop at golden hour")
        .with_aspect_ratio(AspectRatio::Portrait);

    let marketing = client
        .image()
        .generate_marketing_image(request.clone())
        .await?;
    println!(
        "marketing image: {} chars (fallback: {})",
        marketing.data_uri.len(),
        marketing.is_source_fallback
    );

    let comparison = client.compare(variants::style_pair(request)).await;
    for (slot, image) in comparison.successes() {
        println!("{}: {} chars", slot, image.data_uri.len());
    }
    for (slot, error) in comparison.failures() {
        println!("{} failed: {}", slot, error);
    }

    Ok(())
}
