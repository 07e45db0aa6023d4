use super::BlockSource;

/// One block of lookahead over a [`BlockSource`].
///
/// `shift` is the only writer of both slots: the waiting block moves into
/// the current slot and a fresh block is fetched into the waiting slot. A
/// freshly constructed buffer therefore needs two shifts before `current`
/// holds the first block of the stream.
#[derive(Debug)]
pub struct Lookahead<B> {
    current: Option<B>,
    waiting: Option<B>,
}
impl<B> Default for Lookahead<B> {
    fn default() -> Self {
        Self {
            current: None,
            waiting: None,
        }
    }
}
impl<B> Lookahead<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifting past the end of the stream is not an error; both slots
    /// simply drain to `None`. On a fetch error neither slot changes.
    pub fn shift<S>(&mut self, source: &mut S) -> crate::Result<()>
    where
        S: BlockSource<Block = B> + ?Sized,
    {
        let fetched = source.read_block()?;
        self.current = std::mem::replace(&mut self.waiting, fetched);
        Ok(())
    }

    pub fn current(&self) -> Option<&B> {
        self.current.as_ref()
    }

    pub fn waiting(&self) -> Option<&B> {
        self.waiting.as_ref()
    }

    /// Drops both slots, e.g. after the source has been repositioned.
    pub fn clear(&mut self) {
        self.current = None;
        self.waiting = None;
    }
}
