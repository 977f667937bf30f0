use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;

use colorpatch::config::AppConfig;
use colorpatch::domain::Size;
use colorpatch::error::Side;
use colorpatch::imaging::SourceImage;
use colorpatch::session::{Action, Msg, Session};
use colorpatch::submit::{self, Processor};

#[derive(Parser, Debug)]
#[command(
    name = "colorpatch",
    version,
    about = "Replay a masking session and submit it for processing"
)]
struct Args {
    /// Session script (JSON): images, container size and recorded events
    script: PathBuf,

    /// Processor base URL, overrides the configured one
    #[arg(long)]
    worker_url: Option<String>,

    /// Where to write the processed PNG
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Script {
    source: PathBuf,
    reference: PathBuf,
    container: Size,
    #[serde(default)]
    events: Vec<Msg>,
}

fn load_script(path: &Path) -> anyhow::Result<Script> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("parsing script {}", path.display()))?;
    Ok(script)
}

/// Resolve image paths relative to the script's directory
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    file.write_all(bytes)?;
    file.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = AppConfig::load();
    if let Some(url) = args.worker_url {
        config.worker_url = url;
    }

    let script = load_script(&args.script)?;
    let base = args
        .script
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let processor = Processor::new(&config)?;
    let mut session = Session::new(config, script.container);
    for (side, path) in [(Side::Source, &script.source), (Side::Reference, &script.reference)] {
        let path = resolve(&base, path);
        let image = SourceImage::from_path(&path)
            .with_context(|| format!("loading {} image {}", side, path.display()))?;
        session.load_image(side, image);
    }

    let mut requested = false;
    for event in script.events {
        if session.update(event) == Some(Action::Submit) {
            requested = true;
        }
    }
    if !requested {
        log::info!("Script did not request generation, submitting anyway");
    }
    for (color, side) in session.awaiting_pairing() {
        eprintln!("{} is only painted on the {} image", color, side);
    }

    let pending = session.prepare_submission()?;
    let result = submit::submit(pending, &processor).await;
    session.record_outcome(&result);
    let processed = match result {
        Ok(processed) => processed,
        Err(err) if err.is_local() => bail!("{}", err),
        Err(err) => return Err(err).context(format!("processing via {}", processor.url())),
    };

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "colorpatch_{}.png",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        ))
    });
    write_output(&output, &processed.bytes)?;
    println!(
        "Wrote {}x{} result to {}",
        processed.width(),
        processed.height(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parses_with_relative_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r##"{
                "source": "before.png",
                "reference": "/abs/after.jpg",
                "container": {"width": 800.0, "height": 600.0},
                "events": [{"Tool": {"SelectColor": "#00ff00"}}, "Generate"]
            }"##,
        )
        .unwrap();
        let script = load_script(&path).unwrap();
        assert_eq!(script.events.len(), 2);
        assert_eq!(resolve(dir.path(), &script.source), dir.path().join("before.png"));
        assert_eq!(resolve(dir.path(), &script.reference), PathBuf::from("/abs/after.jpg"));
    }

    #[test]
    fn test_write_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        std::fs::write(&path, b"old").unwrap();
        write_output(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
