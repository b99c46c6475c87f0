// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod transactions;
pub mod history;
pub mod stats;
pub mod doctor;
