/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use selector_checker::ElementSelectorFlags;
use selector_checker::context::{MatchingMode, QuirksMode};
use selector_checker::has_cache::HasResult;

size_of_test!(test_size_of_matching_mode, MatchingMode, 1);
size_of_test!(test_size_of_quirks_mode, QuirksMode, 1);
size_of_test!(test_size_of_has_result, HasResult, 1);
size_of_test!(test_size_of_element_selector_flags, ElementSelectorFlags, 4);
