//! Static cmdlet descriptions.
//!
//! A cmdlet is data: which service and operation it calls, which parameters
//! it binds, how the operation paginates, and what part of the response it
//! writes by default. `invoke` interprets these descriptions generically.
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::params::{COMMON_PARAMETERS, PAGING_PARAMETERS, ParameterSpec};

/// Remote services with cmdlets in the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ServiceId {
    /// Amazon CloudWatch.
    #[strum(serialize = "monitoring")]
    #[serde(rename = "monitoring")]
    CloudWatch,
    /// Amazon Chime SDK Messaging.
    #[strum(serialize = "messaging-chime")]
    #[serde(rename = "messaging-chime")]
    ChimeSdkMessaging,
    /// AWS IoT Greengrass.
    #[strum(serialize = "greengrass")]
    #[serde(rename = "greengrass")]
    Greengrass,
}

impl ServiceId {
    /// Noun prefix shared by the service's cmdlets.
    pub fn noun_prefix(&self) -> &'static str {
        match self {
            ServiceId::CloudWatch => "CW",
            ServiceId::ChimeSdkMessaging => "CHMMG",
            ServiceId::Greengrass => "GG",
        }
    }
}

/// How a list/describe operation pages its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    /// Request member carrying the continuation token.
    pub input_token: &'static str,
    /// Response member carrying the next continuation token.
    pub output_token: &'static str,
    /// Response member holding the page's items.
    pub items: &'static str,
    /// Cmdlet parameter bound to the page size, if the operation has one.
    pub page_size: Option<&'static str>,
}

impl PaginationSpec {
    /// `NextToken` in, `NextToken` out.
    pub const fn next_token(items: &'static str) -> Self {
        Self {
            input_token: "NextToken",
            output_token: "NextToken",
            items,
            page_size: None,
        }
    }

    /// Names the page-size parameter.
    pub const fn page_size(mut self, parameter: &'static str) -> Self {
        self.page_size = Some(parameter);
        self
    }
}

/// One generated cmdlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdletSpec {
    /// `Verb-Noun` name.
    pub name: &'static str,
    /// Service the operation belongs to.
    pub service: ServiceId,
    /// Operation name as the service knows it.
    pub operation: &'static str,
    /// Cmdlet-specific parameters.
    pub parameters: &'static [ParameterSpec],
    /// Present for paginated operations.
    pub pagination: Option<PaginationSpec>,
    /// Selector used when `-Select` is not given; empty writes nothing.
    /// `None` selects the page items of a paginated operation.
    pub default_select: Option<&'static str>,
    /// One-line synopsis.
    pub synopsis: &'static str,
}

impl CmdletSpec {
    /// Cmdlet parameters followed by the common (and paging) parameters.
    pub fn all_parameters(&self) -> Vec<&'static ParameterSpec> {
        let paging: &'static [ParameterSpec] = if self.pagination.is_some() {
            PAGING_PARAMETERS
        } else {
            &[]
        };
        self.parameters
            .iter()
            .chain(COMMON_PARAMETERS)
            .chain(paging)
            .collect()
    }

    /// Whether the operation is paginated.
    pub fn is_paginated(&self) -> bool {
        self.pagination.is_some()
    }

    /// Selector expression written when `-Select` is not given.
    pub fn default_selection(&self) -> &'static str {
        self.default_select
            .or(self.pagination.map(|p| p.items))
            .unwrap_or("*")
    }
}
