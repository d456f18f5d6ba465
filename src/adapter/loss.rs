use crate::priv_prelude::*;

/// `Stream` adapter which drops `Ok` items in bursts. Can be created via
/// [`DatagramStreamExt::with_loss`](crate::DatagramStreamExt::with_loss).
///
/// See [`LossConfig`](crate::LossConfig) for how bursts start and stop. Errors are always let
/// through and don't count as items seen by the loss model.
#[pin_project]
pub struct Loss<S> {
    #[pin]
    stream: S,
    bursts: Bursts,
    passed: u64,
    dropped: u64,
}

struct Bursts {
    config: LossConfig,
    dropping: bool,
    rng: StdRng,
}

impl Bursts {
    /// Moves the model on by one item and reports whether that item should be dropped.
    fn advance(&mut self) -> bool {
        if self.dropping {
            if self.rng.gen_bool(self.config.loss_stop) {
                self.dropping = false;
            }
        } else if !self.config.is_lossless() && self.rng.gen_bool(self.config.loss_start) {
            self.dropping = true;
        }
        self.dropping
    }
}

impl<S> Loss<S> {
    /// Creates a new [`Loss`] seeded from the operating system's entropy source.
    ///
    /// # Panics
    ///
    /// If either probability in `config` lies outside `[0, 1]`.
    pub fn new(stream: S, config: LossConfig) -> Loss<S> {
        Loss::with_rng(stream, config, StdRng::from_entropy())
    }

    /// Creates a new [`Loss`] which makes its drop decisions with the given rng.
    ///
    /// # Panics
    ///
    /// If either probability in `config` lies outside `[0, 1]`.
    pub fn with_rng(stream: S, config: LossConfig, rng: StdRng) -> Loss<S> {
        if let Err(err) = config.validate() {
            panic!("invalid loss config: {}", err);
        }
        Loss {
            stream,
            bursts: Bursts {
                config,
                dropping: false,
                rng,
            },
            passed: 0,
            dropped: 0,
        }
    }

    /// Number of items let through so far.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Number of items dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns `true` if a loss burst is in progress.
    pub fn currently_dropping(&self) -> bool {
        self.bursts.dropping
    }

    /// Consumes the adapter, returning the wrapped stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Stream for Loss<S>
where
    S: TryStream,
{
    type Item = Result<S::Ok, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut task::Context) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            match ready!(this.stream.as_mut().try_poll_next(cx)) {
                Some(Ok(value)) => {
                    if this.bursts.advance() {
                        *this.dropped += 1;
                        continue;
                    }
                    *this.passed += 1;
                    break Poll::Ready(Some(Ok(value)));
                },
                Some(Err(err)) => break Poll::Ready(Some(Err(err))),
                None => break Poll::Ready(None),
            }
        }
    }
}
