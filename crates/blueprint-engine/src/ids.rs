use crate::{OutputType, TypeRegistry};

/// Most output types one registry may hold. Ids store `index + 1` in a `NonZeroU32`.
const MAX_ID: usize = (1 << 29) - 1;

macro_rules! id_newtypes {
    ($($ty:ident.$field:ident[$name:ident] => $out:ident unless $msg:literal,)*) => {
        $(
            #[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
            pub struct $name(std::num::NonZeroU32);

            impl std::ops::Index<$name> for $ty {
                type Output = $out;

                fn index(&self, index: $name) -> &$out {
                    &self.$field[usize::from(index)]
                }
            }

            impl std::ops::IndexMut<$name> for $ty {
                fn index_mut(&mut self, index: $name) -> &mut $out {
                    &mut self.$field[usize::from(index)]
                }
            }

            impl From<usize> for $name {
                fn from(index: usize) -> Self {
                    assert!(index <= MAX_ID, $msg);
                    // Cannot saturate below MAX_ID.
                    Self(std::num::NonZeroU32::MIN.saturating_add(index as u32))
                }
            }

            impl From<$name> for usize {
                fn from(id: $name) -> Self {
                    (id.0.get() - 1) as usize
                }
            }
        )*
    }
}

id_newtypes! {
    TypeRegistry.types[OutputTypeId] => OutputType unless "Too many output types",
}
