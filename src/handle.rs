/// Declares a typed index into a [`Pool`](crate::pool::Pool).
///
/// Handles are plain `u32` slots. They carry no generation of their own: a
/// pool only hands out slots below its active count, and indexing checks that
/// in debug builds.
macro_rules! impl_handle {
    ($(#[$meta:meta])* $idx_name:ident, $dbg_prefix:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $idx_name(u32);

        impl std::fmt::Debug for $idx_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", $dbg_prefix, self.0)
            }
        }

        impl $crate::pool::Handle for $idx_name {
            fn from_slot(slot: usize) -> Self {
                match u32::try_from(slot) {
                    Ok(slot) => Self(slot),
                    Err(_) => panic!("pool handle space exhausted"),
                }
            }

            fn slot(self) -> usize {
                self.0 as usize
            }
        }
    };
}
