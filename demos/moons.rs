use backprop_mlp::{ExperimentConfig, run_experiment};
use tracing::Level;

fn main() -> backprop_mlp::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // Four architectures, 2000 train / 2000 test points, 5 epochs of 200-instance batches.
    let cfg = ExperimentConfig::default();
    for outcome in run_experiment(&cfg)? {
        let final_loss = outcome.report.last().map(|e| e.mean_loss);
        println!(
            "layer_sizes={:?} final_epoch_loss={:?} test_error_rate={:.4}",
            outcome.layer_sizes, final_loss, outcome.test_error
        );
    }
    Ok(())
}
