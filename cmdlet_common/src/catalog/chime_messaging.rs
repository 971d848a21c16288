//! Amazon Chime SDK Messaging cmdlets.
use crate::cmdlet::{CmdletSpec, PaginationSpec, ServiceId};
use crate::params::{ParamKind, ParameterSpec};

const PRIVACY: &[&str] = &["PUBLIC", "PRIVATE"];
const SORT_ORDER: &[&str] = &["ASCENDING", "DESCENDING"];
const MESSAGE_TYPE: &[&str] = &["STANDARD", "CONTROL"];
const PERSISTENCE: &[&str] = &["PERSISTENT", "NON_PERSISTENT"];

/// Chime SDK Messaging cmdlets.
pub const CMDLETS: &[CmdletSpec] = &[
    CmdletSpec {
        name: "Get-CHMMGChannelList",
        service: ServiceId::ChimeSdkMessaging,
        operation: "ListChannels",
        parameters: &[
            ParameterSpec::new("AppInstanceArn", "AppInstanceArn", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("ChimeBearer", "ChimeBearer", ParamKind::String)
                .required()
                .help("ARN of the user making the call"),
            ParameterSpec::new("Privacy", "Privacy", ParamKind::Enum(PRIVACY)),
            ParameterSpec::new("MaxResult", "MaxResults", ParamKind::Integer)
                .aliases(&["MaxResults", "MaxItems"])
                .help("Channels per page"),
        ],
        pagination: Some(PaginationSpec::next_token("Channels").page_size("MaxResult")),
        default_select: None,
        synopsis: "List the channels of an app instance",
    },
    CmdletSpec {
        name: "Get-CHMMGChannelMessageList",
        service: ServiceId::ChimeSdkMessaging,
        operation: "ListChannelMessages",
        parameters: &[
            ParameterSpec::new("ChannelArn", "ChannelArn", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("ChimeBearer", "ChimeBearer", ParamKind::String)
                .required()
                .help("ARN of the user making the call"),
            ParameterSpec::new("SortOrder", "SortOrder", ParamKind::Enum(SORT_ORDER)),
            ParameterSpec::new("NotBefore", "NotBefore", ParamKind::Timestamp),
            ParameterSpec::new("NotAfter", "NotAfter", ParamKind::Timestamp),
            ParameterSpec::new("MaxResult", "MaxResults", ParamKind::Integer)
                .aliases(&["MaxResults", "MaxItems"])
                .help("Messages per page"),
        ],
        pagination: Some(PaginationSpec::next_token("ChannelMessages").page_size("MaxResult")),
        default_select: None,
        synopsis: "List the messages of a channel",
    },
    CmdletSpec {
        name: "Send-CHMMGChannelMessage",
        service: ServiceId::ChimeSdkMessaging,
        operation: "SendChannelMessage",
        parameters: &[
            ParameterSpec::new("ChannelArn", "ChannelArn", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("Content", "Content", ParamKind::String)
                .required()
                .position(1),
            ParameterSpec::new("ChimeBearer", "ChimeBearer", ParamKind::String).required(),
            ParameterSpec::new("Type", "Type", ParamKind::Enum(MESSAGE_TYPE)).required(),
            ParameterSpec::new("Persistence", "Persistence", ParamKind::Enum(PERSISTENCE))
                .required(),
            ParameterSpec::new("Metadata", "Metadata", ParamKind::String),
            ParameterSpec::new("ClientRequestToken", "ClientRequestToken", ParamKind::String),
        ],
        pagination: None,
        default_select: Some("MessageId"),
        synopsis: "Send a message to a channel",
    },
];
