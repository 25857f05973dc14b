use std::env;

use studiogen::{
    logger::{self, LoggerConfig},
    variants, GenerationConfig, ImageGenerationRequest, ImageInput, StudioClient, StudioConfig,
};

const USAGE: &str = "usage: studiogen <image-url|data-uri|file> [context...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init_with_config(LoggerConfig::from_env())?;
    if !dotenv_loaded {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let mut args = env::args().skip(1);
    let source = match args.next() {
        Some(source) => source,
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    let context = args.collect::<Vec<_>>().join(" ");

    let source = if std::path::Path::new(&source).is_file() {
        ImageInput::from_bytes(&std::fs::read(&source)?)
    } else {
        ImageInput::parse(&source)
    };

    let config = StudioConfig::from_env();
    logger::log_config_info(&config);
    let client = StudioClient::new(config)?;

    let flags: GenerationConfig = match env::var("STUDIO_FLAGS") {
        Ok(raw) => serde_json::from_str(&raw)?,
        Err(_) => GenerationConfig {
            preserve_product_label: true,
            preserve_face: true,
            ..GenerationConfig::default()
        },
    };

    let request = ImageGenerationRequest::new(source, flags).with_context(context);
    let comparison = client.compare(variants::style_pair(request)).await;

    for (slot, error) in comparison.failures() {
        log::error!("❌ {} failed: {}", slot, error);
    }
    for (slot, image) in comparison.successes() {
        let filename = format!(
            "variant_{}_{}.png",
            format!("{:?}", slot).to_lowercase(),
            image.created_at.timestamp()
        );
        image.save_to(&filename)?;
        log::info!("💾 {} saved to {}", slot, filename);
    }

    if comparison.all_failed() {
        return Err("both variants failed, try again".into());
    }
    Ok(())
}
