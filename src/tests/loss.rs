use crate::priv_prelude::*;
use futures::TryStreamExt;

const NUM_MSGS: usize = 10_000;

fn datagrams() -> impl Stream<Item = io::Result<usize>> {
    futures::stream::iter((0..NUM_MSGS).map(Ok))
}

async fn received_flags(config: LossConfig, seed: u64) -> Vec<bool> {
    let mut lossy = Loss::with_rng(datagrams(), config, StdRng::seed_from_u64(seed));
    let mut received = vec![false; NUM_MSGS];
    while let Some(val) = lossy.next().await {
        received[val.unwrap()] = true;
    }
    let lost_count = received.iter().filter(|x| !**x).count();
    assert_eq!(lossy.dropped(), lost_count as u64);
    assert_eq!(lossy.passed(), (NUM_MSGS - lost_count) as u64);
    received
}

#[tokio::test]
async fn lossless_config_passes_everything() {
    let received: Vec<usize> = datagrams().with_loss(LossConfig::NONE).try_collect().await.unwrap();
    assert_eq!(received, (0..NUM_MSGS).collect::<Vec<_>>());
}

#[tokio::test]
async fn certain_start_and_stop_alternates() {
    let received = received_flags(LossConfig::new(1.0, 1.0).unwrap(), 1).await;
    for (index, received) in received.iter().enumerate() {
        assert_eq!(*received, index % 2 == 1);
    }
}

#[tokio::test]
async fn burst_without_stop_drops_everything() {
    let received = received_flags(LossConfig::new(1.0, 0.0).unwrap(), 2).await;
    assert!(received.iter().all(|received| !*received));
}

#[tokio::test]
async fn loss_rate_is_approx_correct() {
    const LOSS_START: f64 = 0.1;
    const LOSS_STOP: f64 = 0.4;

    let config = LossConfig::new(LOSS_START, LOSS_STOP).unwrap();
    let received = received_flags(config, 3).await;

    let lost_count = received.iter().filter(|x| !**x).count();
    let loss_rate = (lost_count as f64) / (NUM_MSGS as f64);
    let expected_loss_rate = config.expected_loss_rate();
    assert!((expected_loss_rate - 0.2).abs() < 1e-9);
    assert!(loss_rate < expected_loss_rate * 1.2);
    assert!(expected_loss_rate < loss_rate * 1.2);
}

#[tokio::test]
async fn losses_come_in_bursts() {
    const LOSS_START: f64 = 0.05;
    const LOSS_STOP: f64 = 0.25;

    let received = received_flags(LossConfig::new(LOSS_START, LOSS_STOP).unwrap(), 4).await;

    let mut bursts = 0;
    let mut lost = 0;
    let mut prev_received = true;
    for received in received {
        if !received {
            lost += 1;
            if prev_received {
                bursts += 1;
            }
        }
        prev_received = received;
    }
    let mean_burst_len = (lost as f64) / (bursts as f64);
    let expected_mean_burst_len = 1.0 / LOSS_STOP;
    assert!(mean_burst_len < expected_mean_burst_len * 1.25);
    assert!(expected_mean_burst_len < mean_burst_len * 1.25);
}

#[tokio::test]
async fn errors_get_through_a_loss_burst() {
    let items = vec![
        Ok(0),
        Ok(1),
        Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        Ok(2),
    ];
    let config = LossConfig::new(1.0, 0.0).unwrap();
    let mut lossy = Loss::with_rng(futures::stream::iter(items), config, StdRng::seed_from_u64(5));

    let err = lossy.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    assert!(lossy.next().await.is_none());
    assert_eq!(lossy.dropped(), 3);
    assert_eq!(lossy.passed(), 0);
    assert!(lossy.currently_dropping());
}

#[test]
#[should_panic(expected = "invalid loss config")]
fn out_of_range_probability_panics() {
    let config = LossConfig {
        loss_start: 1.5,
        loss_stop: 0.5,
    };
    let _loss = Loss::new(futures::stream::empty::<io::Result<()>>(), config);
}
