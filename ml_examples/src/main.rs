// ml_examples/src/main.rs
use anyhow::{Context, Result};
use binary_dnn::{
    accuracy, confusion_matrix, generate_separable_data, load_config, print_summary_table,
    DeepNetwork, TrainingConfig,
};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("binary_dnn=info".parse()?)
                .add_directive("ml_examples=info".parse()?),
        )
        .init();

    // Optional first argument: path to a JSON training config.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path).with_context(|| format!("loading config {}", path))?,
        None => TrainingConfig::default(),
    };

    let mut rng = rand::thread_rng();
    let (x_train, y_train) = generate_separable_data(400, 2, &mut rng)?;
    let (x_test, y_test) = generate_separable_data(100, 2, &mut rng)?;

    info!("=== Separable toy data ===");
    let mut net = DeepNetwork::with_rng(2, &[5, 3, 1], &mut rng)?;
    info!("Model Summary: {}", net);

    let mut costs = Vec::new();
    let (train_pred, train_cost) =
        net.train_with_sink(&x_train, &y_train, &config, |i, cost| costs.push((i, cost)))?;
    if config.graph {
        print_summary_table(&costs, "Training Cost");
    }
    info!(
        "Train cost: {:.6}, accuracy: {:.2}%",
        train_cost,
        accuracy(&train_pred, &y_train)? * 100.0
    );

    let (test_pred, test_cost) = net.evaluate(&x_test, &y_test)?;
    info!(
        "Test cost: {:.6}, accuracy: {:.2}%",
        test_cost,
        accuracy(&test_pred, &y_test)? * 100.0
    );
    info!("Confusion matrix [true][pred]: {:?}", confusion_matrix(&test_pred, &y_test)?);

    // Demo: save and load model
    let path = net.save_pere("models/separable")?;
    let mut reloaded = DeepNetwork::load_pere(&path)?;
    let (reloaded_pred, _) = reloaded.evaluate(&x_test, &y_test)?;
    info!(
        "Test accuracy (reloaded from {}): {:.2}%",
        path.display(),
        accuracy(&reloaded_pred, &y_test)? * 100.0
    );

    Ok(())
}
