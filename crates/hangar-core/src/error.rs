// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and Hangar Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::types::{BlockHeight, Wei};

pub type HangarResult<T> = Result<T, HangarError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HangarError {
    #[error("quantity must be non-zero")]
    ZeroQuantity,

    #[error("mint would exceed max supply")]
    SoldOut,

    #[error("minting is closed for this entry point in the current phase")]
    MintingClosed,

    #[error("merkle proof does not match the active phase root")]
    InvalidProof,

    #[error("insufficient value: required {required}, provided {provided}")]
    InsufficientValue { required: Wei, provided: Wei },

    #[error("quantity exceeds remaining allowance")]
    InsufficientAllowance,

    #[error("action not permitted in current pilot status")]
    InvalidPilotStatus,

    #[error("caller is not authorized")]
    Unauthorized,

    #[error("invalid custom pilot: {0}")]
    InvalidCustomPilot(&'static str),

    #[error("invalid batch pilot action")]
    InvalidBatchPilotAction,

    #[error("owner query for nonexistent token")]
    OwnerQueryForNonexistentToken,

    #[error("uri query for nonexistent token")]
    URIQueryForNonexistentToken,

    #[error("transfer from incorrect owner")]
    TransferFromIncorrectOwner,

    #[error("transfer to the zero address")]
    TransferToZeroAddress,

    #[error("block height went backwards: last {last}, got {got}")]
    ClockRegression { last: BlockHeight, got: BlockHeight },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}
