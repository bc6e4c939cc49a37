/// Declares an enum standing for a subset of the values of a Vulkan enum.
///
/// Each variant is written as `Variant = CONSTANT`, naming the constant of
/// `$vk` it maps to.
#[macro_export]
macro_rules! vk_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $vk:ty {
            $($(#[$variant_meta:meta])* $variant:ident = $constant:ident,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant,)*
        }

        impl $name {
            pub const fn to_vk(self) -> $vk {
                match self {
                    $(Self::$variant => <$vk>::$constant,)*
                }
            }
        }
    };
}

/// Declares a newtype over a Vulkan flags type, exposing the listed bits under
/// their Vulkan names.
#[macro_export]
macro_rules! vk_flags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident: $vk:ty {
            $($bit:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        $vis struct $name($vk);

        impl $name {
            $(pub const $bit: Self = Self(<$vk>::$bit);)*

            pub const fn to_vk(self) -> $vk {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}
