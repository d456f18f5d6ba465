use crate::priv_prelude::*;

/// Extension trait for fallible streams of datagrams.
pub trait DatagramStreamExt: TryStream {
    /// Randomly drops `Ok` items received through this `Stream`, in bursts. Errors always get
    /// through.
    ///
    /// * `loss.loss_start` is the probability of a passing item starting a loss burst. Setting
    /// this to `0.0` drops nothing.
    /// * `loss.loss_stop` is the probability of an item ending the current burst. Setting this
    /// to `1.0` makes every burst a single item long, so each item has an independent chance of
    /// getting dropped.
    fn with_loss(self, loss: LossConfig) -> crate::adapter::Loss<Self>
    where
        Self: Sized,
    {
        crate::adapter::Loss::new(self, loss)
    }
}

impl<S> DatagramStreamExt for S
where
    S: TryStream,
{
}
