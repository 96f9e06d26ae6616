//! State Broadcast Channel
//!
//! A channel is the accessor/mutator pair a provider publishes to its
//! subtree. Consumers clone the pair, never the value, so every consumer of
//! one channel observes the same committed state.

use super::signal::{create_signal, ReadSignal, Update, WriteSignal};

/// An accessor and a mutator over one shared signal.
pub struct Channel<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    read: ReadSignal<T>,
    write: WriteSignal<T>,
}

impl<T> Channel<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Tracked read of the current value.
    pub fn read(&self) -> T {
        self.read.get()
    }

    /// Untracked read of the current value.
    pub fn peek(&self) -> T {
        self.read.get_untracked()
    }

    /// Apply a replacement or a transform.
    pub fn write(&self, update: Update<T>) {
        self.write.apply(update);
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.write.set(value);
    }

    /// Transform the value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.write.update(f);
    }

    /// The accessor half.
    pub fn reader(&self) -> ReadSignal<T> {
        self.read.clone()
    }

    /// The mutator half.
    pub fn writer(&self) -> WriteSignal<T> {
        self.write.clone()
    }
}

impl<T> Clone for Channel<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            write: self.write.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Channel<T>
where
    T: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("value", &self.peek()).finish()
    }
}

/// Construct a fresh channel holding `initial`.
pub fn create_channel<T>(initial: T) -> Channel<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let (read, write) = create_signal(initial);
    Channel { read, write }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::batch;

    #[test]
    fn channels_are_isolated() {
        let a = create_channel(0i64);
        let b = create_channel(0i64);

        a.set(7);
        a.update(|x| x + 1);

        assert_eq!(a.read(), 8);
        assert_eq!(b.read(), 0);
    }

    #[test]
    fn clones_share_the_value() {
        let channel = create_channel(1i64);
        let consumer = channel.clone();

        consumer.write(Update::transform(|x: &i64| x * 10));
        assert_eq!(channel.peek(), 10);
    }

    #[test]
    fn reads_inside_a_batch_see_every_write() {
        let channel = create_channel(10i64);

        batch(|| {
            channel.update(|x| x - 1);
            assert_eq!(channel.peek(), 9);
            channel.update(|x| x + 1);
        });

        assert_eq!(channel.read(), 10);
    }
}
