/// Fixed-capacity ring buffer used for the pixel FIFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArrayQueue<T, const N: usize> {
    arr: [T; N],
    start: usize,
    len: usize,
}

impl<T, const N: usize> ArrayQueue<T, N>
where
    T: Copy + Default,
{
    pub(crate) fn new() -> Self {
        Self { arr: [T::default(); N], start: 0, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let front = self.arr[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;

        Some(front)
    }

    /// # Panics
    ///
    /// Panics if the queue is full. Callers check `len()` before pushing a batch.
    pub(crate) fn push_back(&mut self, value: T) {
        assert!(self.len < N, "ArrayQueue has exceeded capacity of {N}");

        self.arr[(self.start + self.len) % N] = value;
        self.len += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::ArrayQueue;

    #[test]
    fn push_pop() {
        let mut q: ArrayQueue<u32, 16> = ArrayQueue::new();
        assert_eq!(None, q.pop_front());

        q.push_back(55);
        assert_eq!(1, q.len());
        assert_eq!(Some(55), q.pop_front());
        assert_eq!(None, q.pop_front());
        assert_eq!(0, q.len());
    }

    #[test]
    fn wraps_around() {
        let mut q: ArrayQueue<u32, 16> = ArrayQueue::new();

        for n in 0..12 {
            q.push_back(n);
        }
        for n in 0..8 {
            assert_eq!(Some(n), q.pop_front());
        }
        for n in 12..24 {
            q.push_back(n);
        }

        assert_eq!(16, q.len());
        for n in 8..24 {
            assert_eq!(Some(n), q.pop_front());
        }
        assert_eq!(None, q.pop_front());
    }

    #[test]
    fn clear() {
        let mut q: ArrayQueue<u32, 16> = ArrayQueue::new();
        q.push_back(1);
        q.push_back(2);
        q.pop_front();

        q.clear();
        assert_eq!(0, q.len());
        assert_eq!(None, q.pop_front());
    }

    #[test]
    #[should_panic(expected = "exceeded capacity")]
    fn capacity_exceeded() {
        let mut q: ArrayQueue<u32, 16> = ArrayQueue::new();

        for _ in 0..17 {
            q.push_back(0);
        }
    }
}
