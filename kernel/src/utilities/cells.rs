// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Re-exports of the `tock-cells` interior-mutability wrappers under
//! the path capsules expect (`kernel::utilities::cells::*`).

pub use tock_cells::map_cell::MapCell;
pub use tock_cells::optional_cell::OptionalCell;
pub use tock_cells::take_cell::TakeCell;
