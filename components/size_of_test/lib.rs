/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub use static_assertions::const_assert_eq;

/// Asserts the size of a type, either at compile time or from a named test.
///
/// The two-argument form is a compile-time assertion. The three-argument form
/// expands to a `#[test]` that reports the actual size when it regresses,
/// which is friendlier while a type is still changing shape.
#[macro_export]
macro_rules! size_of_test {
    ($t: ty, $expected_size: expr) => {
        #[cfg(target_pointer_width = "64")]
        $crate::const_assert_eq!(std::mem::size_of::<$t>(), $expected_size);
    };
    ($testname: ident, $t: ty, $expected_size: expr) => {
        #[cfg(target_pointer_width = "64")]
        #[test]
        fn $testname() {
            let new = std::mem::size_of::<$t>();
            let old = $expected_size;
            assert!(
                new <= old,
                "Your changes have increased the stack size of {} from {} to {}. \
                 Please consider boxing some of the larger variants.",
                stringify!($t),
                old,
                new
            );
        }
    };
}
