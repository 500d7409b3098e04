use backprop_mlp::{MinMaxScaler, Network, epoch_batches, loss, metrics, moons};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> backprop_mlp::Result<()> {
    let mut rng = StdRng::seed_from_u64(0);

    let raw = moons::make_moons(1_000, 0.05, &mut rng)?;
    let scaler = MinMaxScaler::fit(raw.inputs())?;
    let scaled = scaler.transform(raw.inputs())?;
    let train = raw.with_inputs(scaled)?;

    // 2 -> 16 -> 2 network, driven one forward/backward/update at a time.
    let mut net = Network::new_with_rng(2, &[16, 2], &mut rng)?;
    let lr = 0.05;

    for epoch in 0..20 {
        let mut epoch_loss = 0.0;
        let batches = epoch_batches(train.len(), 50, &mut rng)?;
        for indices in &batches {
            let batch = train.batch(indices)?;
            let posteriors = net.forward(batch.inputs())?;
            epoch_loss += loss::cross_entropy(&posteriors, batch.labels())?;
            net.backward(&posteriors, batch.labels())?;
            for idx in 0..net.num_layers() {
                if let Some(layer) = net.layer_mut(idx) {
                    layer.update(lr)?;
                }
            }
        }

        let predicted = net.predict(train.inputs())?;
        let err = metrics::error_rate(&predicted, train.labels())?;
        println!(
            "epoch={epoch} mean_loss={:.4} train_error_rate={err:.4}",
            epoch_loss / batches.len() as f64
        );
    }

    Ok(())
}
