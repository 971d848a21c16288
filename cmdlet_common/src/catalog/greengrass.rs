//! AWS IoT Greengrass cmdlets.
use crate::cmdlet::{CmdletSpec, PaginationSpec, ServiceId};
use crate::params::{ParamKind, ParameterSpec};

/// Greengrass cmdlets.
pub const CMDLETS: &[CmdletSpec] = &[
    CmdletSpec {
        name: "Get-GGGroupList",
        service: ServiceId::Greengrass,
        operation: "ListGroups",
        parameters: &[ParameterSpec::new("MaxResult", "MaxResults", ParamKind::Integer)
            .aliases(&["MaxResults", "MaxItems"])
            .help("Groups per page")],
        pagination: Some(PaginationSpec::next_token("Groups").page_size("MaxResult")),
        default_select: None,
        synopsis: "List Greengrass groups",
    },
    CmdletSpec {
        name: "Get-GGDeploymentList",
        service: ServiceId::Greengrass,
        operation: "ListDeployments",
        parameters: &[
            ParameterSpec::new("GroupId", "GroupId", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("MaxResult", "MaxResults", ParamKind::Integer)
                .aliases(&["MaxResults", "MaxItems"])
                .help("Deployments per page"),
        ],
        pagination: Some(PaginationSpec::next_token("Deployments").page_size("MaxResult")),
        default_select: None,
        synopsis: "List the deployments of a group",
    },
    CmdletSpec {
        name: "New-GGGroup",
        service: ServiceId::Greengrass,
        operation: "CreateGroup",
        parameters: &[
            ParameterSpec::new("Name", "Name", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("AmznClientToken", "AmznClientToken", ParamKind::String),
            ParameterSpec::new("Tag", "tags", ParamKind::Json)
                .aliases(&["Tags"])
                .help("JSON object of tag keys to values"),
        ],
        pagination: None,
        default_select: Some("*"),
        synopsis: "Create a Greengrass group",
    },
];
