//! Metadata queries issued through the platform service.
//!
//! Custom actions are `workflow` rows of category 3. Their parameters live on
//! the message the action registers, which is several joins away:
//!
//! ```text
//! sdkmessagerequestfield -> sdkmessagerequest -> sdkmessagepair -> sdkmessage -> workflow
//! sdkmessageresponsefield -> sdkmessageresponse -> sdkmessagerequest -> ... -> workflow
//! ```

use action_tester_types::{
    ConditionOperator::Equal,
    JoinOperator, LinkEntity, OrderType, QueryExpression,
    query::FilterExpression,
};

/// Workflow category of custom actions.
const ACTION_CATEGORY: i64 = 3;
/// Workflow type "definition" (as opposed to activation snapshots).
const DEFINITION_TYPE: i64 = 1;
/// Published component state.
const PUBLISHED_COMPONENT_STATE: i64 = 0;
/// Activated status.
const ACTIVATED_STATUS: i64 = 2;

/// Alias of the message link in [`custom_actions_query`].
pub const MESSAGE_ALIAS: &str = "M";

const ACTION_COLUMNS: [&str; 12] = [
    "name",
    "uniquename",
    "createdby",
    "primaryentity",
    "scope",
    "mode",
    "ismanaged",
    "iscustomizable",
    "istransacted",
    "iscustomprocessingstepallowedforotherpublishers",
    "inputparameters",
    "description",
];

/// Activated custom action definitions, managed first, optionally limited to
/// one solution.
pub fn custom_actions_query(solution_id: Option<&str>) -> QueryExpression {
    let mut query = QueryExpression::new("workflow");
    query
        .add_columns(ACTION_COLUMNS)
        .add_order("ismanaged", OrderType::Descending)
        .add_order("name", OrderType::Ascending);
    add_action_criteria(&mut query.criteria);

    let message = query.add_link_with("sdkmessage", "sdkmessageid", "sdkmessageid", JoinOperator::LeftOuter);
    message.alias = Some(MESSAGE_ALIAS.to_string());
    message.add_columns(["name", "workflowsdkstepenabled"]);

    if let Some(solution_id) = solution_id {
        query
            .add_link("solutioncomponent", "workflowid", "objectid")
            .add_condition("solutionid", solution_id);
    }
    query
}

/// Input parameter rows of the action's message, ordered by position.
pub fn request_parameters_query(action_id: &str) -> QueryExpression {
    let mut query = QueryExpression::new("sdkmessagerequestfield");
    query.distinct = true;
    query
        .add_columns(["name", "position", "parameterbindinginformation", "optional", "parser", "fieldmask"])
        .add_order("position", OrderType::Ascending);
    let request = query.add_link("sdkmessagerequest", "sdkmessagerequestid", "sdkmessagerequestid");
    link_request_to_action(request, action_id);
    query
}

/// Output parameter rows of the action's message, ordered by position.
pub fn response_parameters_query(action_id: &str) -> QueryExpression {
    let mut query = QueryExpression::new("sdkmessageresponsefield");
    query.distinct = true;
    query
        .add_columns(["name", "position", "parameterbindinginformation", "formatter", "publicname"])
        .add_order("position", OrderType::Ascending);
    let request = query
        .add_link("sdkmessageresponse", "sdkmessageresponseid", "sdkmessageresponseid")
        .add_link("sdkmessagerequest", "sdkmessagerequestid", "sdkmessagerequestid");
    link_request_to_action(request, action_id);
    query
}

/// Solutions that contain at least one activated custom action.
pub fn solutions_query(managed: bool, include_invisible: bool) -> QueryExpression {
    let mut query = QueryExpression::new("solution");
    query.distinct = true;
    query
        .add_columns(["uniquename", "friendlyname", "version", "solutionid"])
        .add_order("friendlyname", OrderType::Ascending)
        .add_condition("ismanaged", managed)
        .add_condition("isvisible", !include_invisible);

    let component = query.add_link("solutioncomponent", "solutionid", "solutionid");
    component.add_columns(["componenttype"]);
    let workflow = component.add_link("workflow", "objectid", "workflowid");
    add_action_criteria(&mut workflow.criteria);
    query
}

/// Entity-type metadata used to resolve parameter bindings.
pub fn entity_types_query() -> QueryExpression {
    let mut query = QueryExpression::new("entity");
    query
        .add_columns(["objecttypecode", "logicalname", "displayname", "iscustomizable", "isintersect"])
        .add_order("logicalname", OrderType::Ascending);
    query
}

fn add_action_criteria(criteria: &mut FilterExpression) {
    criteria.add_condition("category", Equal, ACTION_CATEGORY);
    criteria.add_condition("type", Equal, DEFINITION_TYPE);
    criteria.add_condition("componentstate", Equal, PUBLISHED_COMPONENT_STATE);
    criteria.add_condition("statuscode", Equal, ACTIVATED_STATUS);
}

fn link_request_to_action(request: &mut LinkEntity, action_id: &str) {
    request
        .add_link("sdkmessagepair", "sdkmessagepairid", "sdkmessagepairid")
        .add_link("sdkmessage", "sdkmessageid", "sdkmessageid")
        .add_link("workflow", "sdkmessageid", "sdkmessageid")
        .add_condition("workflowid", action_id);
}
