use guestwalk_core::{GuestCore, GuestDriver, GuestError, Pa, Va};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A 32-bit `LIST_ENTRY`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct ListEntry32 {
    flink: u32,
    blink: u32,
}

/// An iterator over a circular doubly-linked kernel list.
///
/// Yields the base address of each containing structure: the list links are
/// embedded at `offset` bytes into the structure, so each link address is
/// corrected by subtracting the offset (the `CONTAINING_RECORD` pattern).
/// Iteration ends when the forward link returns to the list head; the head
/// itself is a bare `LIST_ENTRY` and is never yielded.
pub struct ListEntryIterator<'a, Driver>
where
    Driver: GuestDriver,
{
    core: &'a GuestCore<Driver>,
    root: Pa,
    head: Va,
    offset: u64,
    current: Option<Va>,
    done: bool,
}

impl<'a, Driver> ListEntryIterator<'a, Driver>
where
    Driver: GuestDriver,
{
    /// Creates a new list iterator.
    pub fn new(core: &'a GuestCore<Driver>, root: Pa, head: Va, offset: u64) -> Self {
        Self {
            core,
            root,
            head,
            offset,
            current: None,
            done: false,
        }
    }
}

impl<Driver> Iterator for ListEntryIterator<'_, Driver>
where
    Driver: GuestDriver,
{
    type Item = Result<Va, GuestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.current.unwrap_or(self.head);

        let entry = match self.core.read_struct::<ListEntry32>((current, self.root)) {
            Ok(entry) => entry,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        let next = Va(u64::from(entry.flink));
        if next == self.head {
            self.done = true;
            return None;
        }

        self.current = Some(next);
        Some(Ok(next - self.offset))
    }
}
