//! Structured relational query model handed to the platform service.
//!
//! The model mirrors the platform's query expression: a root entity with a
//! column set, a flat conjunction of conditions, sort orders and nested
//! joins ("links"). It is plain data; building specific queries is the
//! engine's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinOperator {
    #[default]
    Inner,
    LeftOuter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionExpression {
    pub attribute: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpression {
    pub attribute: String,
    pub order: OrderType,
}

/// Conditions joined with AND.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterExpression {
    #[serde(default)]
    pub conditions: Vec<ConditionExpression>,
}

impl FilterExpression {
    pub fn add_condition(&mut self, attribute: impl Into<String>, operator: ConditionOperator, value: impl Into<Value>) {
        self.conditions.push(ConditionExpression {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        });
    }

    fn find(&self, attribute: &str) -> Option<&Value> {
        self.conditions
            .iter()
            .find(|condition| condition.attribute == attribute)
            .map(|condition| &condition.value)
    }
}

/// A join from the enclosing entity to `to_entity`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkEntity {
    pub from_entity: String,
    pub to_entity: String,
    pub from_attribute: String,
    pub to_attribute: String,
    #[serde(default)]
    pub join: JoinOperator,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub criteria: FilterExpression,
    #[serde(default)]
    pub links: Vec<LinkEntity>,
}

impl LinkEntity {
    pub fn add_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn add_condition(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.criteria.add_condition(attribute, ConditionOperator::Equal, value);
        self
    }

    /// Adds an inner join below this link and returns it.
    pub fn add_link(&mut self, to_entity: &str, from_attribute: &str, to_attribute: &str) -> &mut LinkEntity {
        let link = LinkEntity {
            from_entity: self.to_entity.clone(),
            to_entity: to_entity.to_string(),
            from_attribute: from_attribute.to_string(),
            to_attribute: to_attribute.to_string(),
            ..LinkEntity::default()
        };
        self.links.push(link);
        let index = self.links.len() - 1;
        &mut self.links[index]
    }

    fn find_condition(&self, attribute: &str) -> Option<&Value> {
        self.criteria
            .find(attribute)
            .or_else(|| self.links.iter().find_map(|link| link.find_condition(attribute)))
    }

    fn depth(&self) -> usize {
        1 + self.links.iter().map(LinkEntity::depth).max().unwrap_or(0)
    }
}

/// A query against one root entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryExpression {
    pub entity_name: String,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub criteria: FilterExpression,
    #[serde(default)]
    pub orders: Vec<OrderExpression>,
    #[serde(default)]
    pub links: Vec<LinkEntity>,
}

impl QueryExpression {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn add_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn add_order(&mut self, attribute: impl Into<String>, order: OrderType) -> &mut Self {
        self.orders.push(OrderExpression {
            attribute: attribute.into(),
            order,
        });
        self
    }

    pub fn add_condition(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.criteria.add_condition(attribute, ConditionOperator::Equal, value);
        self
    }

    /// Adds an inner join from the root entity and returns it.
    pub fn add_link(&mut self, to_entity: &str, from_attribute: &str, to_attribute: &str) -> &mut LinkEntity {
        self.add_link_with(to_entity, from_attribute, to_attribute, JoinOperator::Inner)
    }

    pub fn add_link_with(&mut self, to_entity: &str, from_attribute: &str, to_attribute: &str, join: JoinOperator) -> &mut LinkEntity {
        let link = LinkEntity {
            from_entity: self.entity_name.clone(),
            to_entity: to_entity.to_string(),
            from_attribute: from_attribute.to_string(),
            to_attribute: to_attribute.to_string(),
            join,
            ..LinkEntity::default()
        };
        self.links.push(link);
        let index = self.links.len() - 1;
        &mut self.links[index]
    }

    /// Value of the first equality condition on `attribute`, searching the
    /// root criteria first and then every link depth-first.
    pub fn find_condition(&self, attribute: &str) -> Option<&Value> {
        self.criteria
            .find(attribute)
            .or_else(|| self.links.iter().find_map(|link| link.find_condition(attribute)))
    }

    /// Number of join hops on the longest link chain.
    pub fn link_depth(&self) -> usize {
        self.links.iter().map(LinkEntity::depth).max().unwrap_or(0)
    }
}
