//! Headless trainer: fits the default network on Fashion-MNIST and saves it to the models folder.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use fashion_trainer::config::{self, MAX_EPOCHS, MIN_EPOCHS, TrainingSettings};
use fashion_trainer::logging;
use fashion_trainer::ml::labels::FASHION_LABELS;
use fashion_trainer::ml::metrics::precision_recall_by_class;
use fashion_trainer::model_store::ModelRegistry;
use fashion_trainer::trainer::{self, TrainEvent, TrainOutcome, TrainRequest};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug)]
struct CliOptions {
    training: TrainingSettings,
    models_dir: Option<PathBuf>,
    dataset_dir: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    match logging::init() {
        Ok(()) => {
            if let Some(path) = logging::current_log_file() {
                println!("Per-epoch details are logged to {}", path.display());
            }
        }
        Err(err) => eprintln!("Logging disabled: {err}"),
    }
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    let options = parse_args(std::env::args().skip(1).collect(), settings.training.clone())?;
    let models_dir = match options.models_dir {
        Some(dir) => dir,
        None => settings
            .resolved_models_dir()
            .map_err(|err| err.to_string())?,
    };
    let dataset_dir = match options.dataset_dir {
        Some(dir) => dir,
        None => settings
            .resolved_dataset_dir()
            .map_err(|err| err.to_string())?,
    };
    let registry = ModelRegistry::new(models_dir).map_err(|err| err.to_string())?;
    let request = TrainRequest::from_settings(
        &options.training,
        options.training.epochs,
        dataset_dir,
    );

    let cancel = AtomicBool::new(false);
    let mut on_event = |event: TrainEvent| match event {
        TrainEvent::Status(text) => println!("{text}"),
        TrainEvent::DatasetReady(dataset) => println!(
            "Loaded {} training and {} test images",
            dataset.train.len(),
            dataset.test.len()
        ),
        TrainEvent::Configured { summary } => println!("{summary}\n"),
        TrainEvent::Epoch(record) => {
            println!(
                "{}: {:.4}  {:.2}s",
                record.epoch, record.loss, record.elapsed_secs
            );
            let _ = std::io::stdout().flush();
        }
        TrainEvent::Saving => println!("Evaluating on the test set..."),
    };
    let outcome = trainer::run(&request, None, &registry, &cancel, &mut on_event)
        .map_err(|err| err.to_string())?;

    match outcome {
        TrainOutcome::Saved { entry, evaluation } => {
            println!(
                "Test accuracy {:.4}, loss {:.4}",
                evaluation.accuracy, evaluation.loss
            );
            for (class, stats) in precision_recall_by_class(&evaluation.confusion)
                .iter()
                .enumerate()
            {
                let label = FASHION_LABELS.get(class).copied().unwrap_or("?");
                println!(
                    "  {label:<12} precision {:.3}  recall {:.3}  support {}",
                    stats.precision, stats.recall, stats.support
                );
            }
            println!("Saved {}", entry.path.display());
        }
        TrainOutcome::Cancelled { epochs_completed } => {
            println!("Stopped after {epochs_completed} epoch(s); nothing saved");
        }
    }
    Ok(())
}

fn parse_args(args: Vec<String>, defaults: TrainingSettings) -> Result<CliOptions, String> {
    let mut training = defaults;
    let mut models_dir = None;
    let mut dataset_dir = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--epochs" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--epochs requires a value".to_string())?;
                training.epochs = value
                    .parse::<usize>()
                    .ok()
                    .filter(|epochs| (MIN_EPOCHS..=MAX_EPOCHS).contains(epochs))
                    .ok_or_else(|| format!("Invalid --epochs value: {value}"))?;
            }
            "--batch-size" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--batch-size requires a value".to_string())?;
                training.batch_size = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --batch-size value: {value}"))?;
            }
            "--learning-rate" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--learning-rate requires a value".to_string())?;
                training.learning_rate = value
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid --learning-rate value: {value}"))?;
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                training.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--models-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--models-dir requires a value".to_string())?;
                models_dir = Some(PathBuf::from(value));
            }
            "--dataset-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--dataset-dir requires a value".to_string())?;
                dataset_dir = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        training,
        models_dir,
        dataset_dir,
    })
}

fn help_text() -> String {
    [
        "fashion-train",
        "",
        "Trains the default Fashion-MNIST network and saves it next to the GUI's models.",
        "",
        "Usage:",
        "  fashion-train [--epochs <n>] [--models-dir <dir>]",
        "",
        "Options:",
        "  --epochs <n>          Training epochs (default from config.toml, 20)",
        "  --batch-size <n>      Batch size (default 100)",
        "  --learning-rate <f>   Adam learning rate (default 0.001)",
        "  --seed <n>            RNG seed (default 42)",
        "  --models-dir <dir>    Where the model artifact is written",
        "  --dataset-dir <dir>   Cache folder for the downloaded archives",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn flags_override_config_defaults() {
        let options = parse_args(
            args(&["--epochs", "3", "--seed", "7", "--models-dir", "out"]),
            TrainingSettings::default(),
        )
        .unwrap();
        assert_eq!(options.training.epochs, 3);
        assert_eq!(options.training.seed, 7);
        assert_eq!(options.training.batch_size, 100);
        assert_eq!(options.models_dir, Some(PathBuf::from("out")));
        assert_eq!(options.dataset_dir, None);
    }

    #[test]
    fn rejects_zero_epochs_and_unknown_flags() {
        assert!(parse_args(args(&["--epochs", "0"]), TrainingSettings::default()).is_err());
        assert!(parse_args(args(&["--epochs", "10001"]), TrainingSettings::default()).is_err());
        assert!(parse_args(args(&["--epochs"]), TrainingSettings::default()).is_err());
        assert!(parse_args(args(&["--fast"]), TrainingSettings::default()).is_err());
    }
}
