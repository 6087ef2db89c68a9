// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Model elements of a CSDL JSON document.
//!
//! An element keeps its `$`-attributes and its annotations in one open
//! map, exactly as they appear in the document, while identifier-named
//! children (properties, container children, enumeration members,
//! schema children) are parsed into [`Member`]s. Parameters and the
//! return type of operations are elements too, so that out-of-line
//! annotations can be merged onto them.

use crate::csdl::qualified_name::is_identifier;
use crate::vocabulary::annotations::Annotations;
use indexmap::IndexMap;
use serde_json::Map;
use serde_json::Value;

/// Kind of a model element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Schema,
    EntityType,
    ComplexType,
    EnumType,
    TypeDefinition,
    Term,
    Action,
    Function,
    EntityContainer,
    EntitySet,
    Singleton,
    ActionImport,
    FunctionImport,
    NavigationProperty,
    Property,
    Parameter,
    ReturnType,
    Other,
}

impl Kind {
    fn from_attribute(v: &str) -> Self {
        match v {
            "EntityType" => Self::EntityType,
            "ComplexType" => Self::ComplexType,
            "EnumType" => Self::EnumType,
            "TypeDefinition" => Self::TypeDefinition,
            "Term" => Self::Term,
            "Action" => Self::Action,
            "Function" => Self::Function,
            "EntityContainer" => Self::EntityContainer,
            "EntitySet" => Self::EntitySet,
            "Singleton" => Self::Singleton,
            "ActionImport" => Self::ActionImport,
            "FunctionImport" => Self::FunctionImport,
            "NavigationProperty" => Self::NavigationProperty,
            "Property" => Self::Property,
            _ => Self::Other,
        }
    }

    /// Entity or complex type.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::EntityType | Self::ComplexType)
    }

    /// Action or function overload.
    #[must_use]
    pub const fn is_operation(self) -> bool {
        matches!(self, Self::Action | Self::Function)
    }
}

/// Position of an element in the document. Elements that omit `$Kind`
/// get their kind from here.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Scope {
    Namespace,
    Schema,
    Container,
    Structure,
    Parameter,
    ReturnType,
}

impl Scope {
    fn default_kind(self, attributes: &Map<String, Value>) -> Kind {
        match self {
            Self::Namespace => Kind::Schema,
            Self::Schema => Kind::Other,
            Self::Container => {
                if attributes.contains_key("$Collection") {
                    Kind::EntitySet
                } else if attributes.contains_key("$Type") {
                    Kind::Singleton
                } else if attributes.contains_key("$Action") {
                    Kind::ActionImport
                } else if attributes.contains_key("$Function") {
                    Kind::FunctionImport
                } else {
                    Kind::Other
                }
            }
            Self::Structure => Kind::Property,
            Self::Parameter => Kind::Parameter,
            Self::ReturnType => Kind::ReturnType,
        }
    }

    const fn of_children(kind: Kind) -> Self {
        match kind {
            Kind::EntityContainer => Self::Container,
            Kind::EntityType | Kind::ComplexType => Self::Structure,
            _ => Self::Schema,
        }
    }
}

/// Identifier-named child of an element.
#[derive(Clone, Debug)]
pub enum Member {
    Element(Element),
    /// Overloads of an action or a function.
    Overloads(Vec<Element>),
    /// Plain value, such as the value of an enumeration member.
    Value(Value),
}

impl Member {
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(v) => Some(v),
            Self::Overloads(_) | Self::Value(_) => None,
        }
    }

    #[must_use]
    pub fn as_overloads(&self) -> Option<&[Element]> {
        match self {
            Self::Overloads(v) => Some(v),
            Self::Element(_) | Self::Value(_) => None,
        }
    }
}

/// Model element.
#[derive(Clone, Debug)]
pub struct Element {
    kind: Kind,
    attributes: Map<String, Value>,
    members: IndexMap<String, Member>,
    parameters: Vec<Element>,
    return_type: Option<Box<Element>>,
}

impl Element {
    pub(crate) fn parse(scope: Scope, object: &Map<String, Value>) -> Self {
        let kind = object
            .get("$Kind")
            .and_then(Value::as_str)
            .map_or_else(|| scope.default_kind(object), Kind::from_attribute);
        let child_scope = Scope::of_children(kind);
        let mut element = Self {
            kind,
            attributes: Map::new(),
            members: IndexMap::new(),
            parameters: Vec::new(),
            return_type: None,
        };
        for (key, value) in object {
            match (key.as_str(), value) {
                ("$Parameter", Value::Array(parameters)) => {
                    element.parameters = parameters
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|p| Self::parse(Scope::Parameter, p))
                        .collect();
                }
                ("$ReturnType", Value::Object(return_type)) => {
                    element.return_type =
                        Some(Box::new(Self::parse(Scope::ReturnType, return_type)));
                }
                (key, value) if is_identifier(key) => {
                    element
                        .members
                        .insert(key.to_string(), Self::parse_member(child_scope, value));
                }
                (key, value) => {
                    element.attributes.insert(key.to_string(), value.clone());
                }
            }
        }
        element
    }

    fn parse_member(scope: Scope, value: &Value) -> Member {
        match value {
            Value::Object(object) => Member::Element(Self::parse(scope, object)),
            Value::Array(overloads) => Member::Overloads(
                overloads
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|o| Self::parse(scope, o))
                    .collect(),
            ),
            v => Member::Value(v.clone()),
        }
    }

    /// Element that only refers to a type, used to describe payloads.
    #[must_use]
    pub fn typed(type_name: Option<&str>, collection: bool) -> Self {
        let mut attributes = Map::new();
        if let Some(type_name) = type_name {
            attributes.insert("$Type".into(), Value::String(type_name.into()));
        }
        if collection {
            attributes.insert("$Collection".into(), Value::Bool(true));
        }
        Self {
            kind: Kind::Other,
            attributes,
            members: IndexMap::new(),
            parameters: Vec::new(),
            return_type: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Attribute (`$`-prefixed key) or annotation.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attributes and annotations in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }

    fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    fn attribute_flag(&self, key: &str) -> bool {
        matches!(self.attributes.get(key), Some(Value::Bool(true)))
    }

    /// `$Name` of a parameter.
    #[must_use]
    pub fn name(&self) -> &str {
        self.attribute_str("$Name").unwrap_or_default()
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.attribute_str("$Type")
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.attribute_flag("$Collection")
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.attribute_flag("$Nullable")
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.attribute_flag("$Abstract")
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.attribute_flag("$IsBound")
    }

    #[must_use]
    pub fn contains_target(&self) -> bool {
        self.attribute_flag("$ContainsTarget")
    }

    #[must_use]
    pub fn base_type(&self) -> Option<&str> {
        self.attribute_str("$BaseType")
    }

    #[must_use]
    pub fn partner(&self) -> Option<&str> {
        self.attribute_str("$Partner")
    }

    #[must_use]
    pub fn on_delete(&self) -> Option<&str> {
        self.attribute_str("$OnDelete")
    }

    #[must_use]
    pub fn underlying_type(&self) -> Option<&str> {
        self.attribute_str("$UnderlyingType")
    }

    /// Schema alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.attribute_str("$Alias")
    }

    /// `$Key` of an entity type: property names or alias objects.
    #[must_use]
    pub fn key(&self) -> Option<&Vec<Value>> {
        self.attributes.get("$Key").and_then(Value::as_array)
    }

    #[must_use]
    pub fn max_length(&self) -> Option<u64> {
        self.attributes.get("$MaxLength").and_then(Value::as_u64)
    }

    /// `$Precision` when numeric.
    #[must_use]
    pub fn precision(&self) -> Option<i64> {
        self.attributes.get("$Precision").and_then(Value::as_i64)
    }

    /// `$Scale` when numeric (`variable` and `floating` are not).
    #[must_use]
    pub fn scale(&self) -> Option<i64> {
        self.attributes.get("$Scale").and_then(Value::as_i64)
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.attributes.get("$DefaultValue")
    }

    /// Action of an action import.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.attribute_str("$Action")
    }

    /// Function of a function import.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        self.attribute_str("$Function")
    }

    /// Entity set returned by an operation import.
    #[must_use]
    pub fn entity_set(&self) -> Option<&str> {
        self.attribute_str("$EntitySet")
    }

    /// Entity set bound to a navigation path of an entity set or a
    /// singleton.
    #[must_use]
    pub fn navigation_property_binding(&self, path: &str) -> Option<&str> {
        self.attributes
            .get("$NavigationPropertyBinding")
            .and_then(|b| b.get(path))
            .and_then(Value::as_str)
    }

    /// Out-of-line annotations of a schema, keyed by target path.
    #[must_use]
    pub fn out_of_line_annotations(&self) -> Option<&Map<String, Value>> {
        self.attributes.get("$Annotations").and_then(Value::as_object)
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub(crate) fn member_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.members.get_mut(name)
    }

    /// Identifier-named children in document order.
    pub fn members(&self) -> impl Iterator<Item = (&String, &Member)> {
        self.members.iter()
    }

    /// Children that are elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = (&String, &Element)> {
        self.members
            .iter()
            .filter_map(|(name, m)| m.as_element().map(|e| (name, e)))
    }

    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.members.get(name).and_then(Member::as_element)
    }

    #[must_use]
    pub fn parameters(&self) -> &[Element] {
        &self.parameters
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.parameters.iter_mut().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn return_type(&self) -> Option<&Element> {
        self.return_type.as_deref()
    }

    pub(crate) fn return_type_mut(&mut self) -> Option<&mut Element> {
        self.return_type.as_deref_mut()
    }

    /// Merge annotations onto the element. Existing annotations with
    /// the same key are replaced.
    pub(crate) fn merge_annotations(&mut self, annotations: &Map<String, Value>) {
        for (key, value) in annotations {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

impl Annotations for Element {
    fn annotations(&self) -> &Map<String, Value> {
        &self.attributes
    }
}
