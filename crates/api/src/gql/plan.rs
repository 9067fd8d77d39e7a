//! Lowers a parsed query document into a tree of fields checked against the
//! schema. Every problem is recorded as a [`FieldError`] and the offending
//! field stays in the tree as [`FieldPlan::Invalid`], so the executor can still
//! answer the rest of the query.

use std::collections::{HashMap, HashSet};

use async_graphql::parser::types::{
    DocumentOperations, Field, FragmentDefinition, OperationDefinition, OperationType, Selection,
    SelectionSet,
};
use async_graphql::parser::{parse_query, Positioned};
use async_graphql::{Name, Value as GqlValue};
use serde_json::{Map, Value};

use super::bindings::Arguments;
use super::error::{FieldError, FieldErrorKind, FieldPath};
use super::schema::{FieldDescriptor, SchemaRegistry, TypeDescriptor, TypeRef};

const TYPENAME: &str = "__typename";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldPlan {
    /// `__typename`, answered from the parent type.
    Typename,
    Resolve {
        ty: TypeRef,
        selection: Vec<PlannedField>,
    },
    /// Rejected during planning; resolves to `null`.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedField {
    pub response_key: String,
    pub name: String,
    pub arguments: Arguments,
    pub plan: FieldPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub root_type: String,
    pub selection: Vec<PlannedField>,
}

#[derive(Debug, Default)]
pub struct Plan {
    /// `None` when the document could not be used at all.
    pub operation: Option<Operation>,
    pub errors: Vec<FieldError>,
}

impl Plan {
    fn rejected(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation: None,
            errors: vec![FieldError::new(kind, FieldPath::root(), message)],
        }
    }
}

pub fn plan(
    schema: &SchemaRegistry,
    source: &str,
    variables: &Map<String, Value>,
    operation_name: Option<&str>,
) -> Plan {
    let document = match parse_query(source) {
        Ok(document) => document,
        Err(e) => return Plan::rejected(FieldErrorKind::Syntax, e.to_string()),
    };

    let operation = match select_operation(document.operations, operation_name) {
        Ok(operation) => operation.node,
        Err(message) => return Plan::rejected(FieldErrorKind::Syntax, message),
    };

    if operation.ty != OperationType::Query {
        return Plan::rejected(
            FieldErrorKind::Syntax,
            "only query operations are supported",
        );
    }

    let root = match schema.query_type() {
        Ok(root) => root,
        Err(e) => return Plan::rejected(FieldErrorKind::UnknownType, e.to_string()),
    };

    let mut planner = Planner {
        schema,
        fragments: &document.fragments,
        variables: effective_variables(&operation, variables),
        active_fragments: HashSet::new(),
        errors: Vec::new(),
    };

    if !operation.directives.is_empty() {
        planner.error(
            FieldErrorKind::InvalidSelection,
            FieldPath::root(),
            "directives are not supported",
        );
    }

    let mut selection = Vec::new();
    planner.plan_selection_set(
        root,
        &operation.selection_set.node,
        &FieldPath::root(),
        &mut selection,
    );

    Plan {
        operation: Some(Operation {
            root_type: root.name.clone(),
            selection,
        }),
        errors: planner.errors,
    }
}

fn select_operation(
    operations: DocumentOperations,
    operation_name: Option<&str>,
) -> Result<Positioned<OperationDefinition>, String> {
    match operations {
        DocumentOperations::Single(operation) => Ok(operation),
        DocumentOperations::Multiple(operations) => match operation_name {
            Some(wanted) => operations
                .into_iter()
                .find(|(name, _)| name.as_str() == wanted)
                .map(|(_, operation)| operation)
                .ok_or_else(|| format!("unknown operation `{wanted}`")),
            None if operations.len() == 1 => operations
                .into_values()
                .next()
                .ok_or_else(|| "document contains no operation".to_string()),
            None => Err("operationName is required when the document has several operations".into()),
        },
    }
}

/// Request variables, with declared defaults filled in for missing ones.
fn effective_variables(
    operation: &OperationDefinition,
    variables: &Map<String, Value>,
) -> Map<String, Value> {
    let mut effective = variables.clone();
    for definition in &operation.variable_definitions {
        let name = definition.node.name.node.to_string();
        if effective.contains_key(&name) {
            continue;
        }
        if let Some(default) = &definition.node.default_value {
            if let Ok(value) = default.node.clone().into_json() {
                effective.insert(name, value);
            }
        }
    }
    effective
}

struct Planner<'a> {
    schema: &'a SchemaRegistry,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    variables: Map<String, Value>,
    active_fragments: HashSet<Name>,
    errors: Vec<FieldError>,
}

impl<'a> Planner<'a> {
    fn error(&mut self, kind: FieldErrorKind, path: FieldPath, message: impl Into<String>) {
        self.errors.push(FieldError::new(kind, path, message));
    }

    fn plan_selection_set(
        &mut self,
        parent: &TypeDescriptor,
        set: &SelectionSet,
        path: &FieldPath,
        out: &mut Vec<PlannedField>,
    ) {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    let planned = self.plan_field(parent, &field.node, path);
                    self.merge(out, planned, path);
                }
                Selection::FragmentSpread(spread) => {
                    if !spread.node.directives.is_empty() {
                        self.error(
                            FieldErrorKind::InvalidSelection,
                            path.clone(),
                            "directives are not supported",
                        );
                        continue;
                    }
                    let name = &spread.node.fragment_name.node;
                    let fragments = self.fragments;
                    let Some(fragment) = fragments.get(name) else {
                        self.error(
                            FieldErrorKind::InvalidSelection,
                            path.clone(),
                            format!("unknown fragment `{name}`"),
                        );
                        continue;
                    };
                    if !self.active_fragments.insert(name.clone()) {
                        self.error(
                            FieldErrorKind::InvalidSelection,
                            path.clone(),
                            format!("fragment `{name}` spreads itself"),
                        );
                        continue;
                    }
                    let on = &fragment.node.type_condition.node.on.node;
                    if self.type_condition_applies(parent, on, path) {
                        self.plan_selection_set(parent, &fragment.node.selection_set.node, path, out);
                    }
                    self.active_fragments.remove(name);
                }
                Selection::InlineFragment(inline) => {
                    if !inline.node.directives.is_empty() {
                        self.error(
                            FieldErrorKind::InvalidSelection,
                            path.clone(),
                            "directives are not supported",
                        );
                        continue;
                    }
                    let applies = match &inline.node.type_condition {
                        Some(condition) => {
                            self.type_condition_applies(parent, &condition.node.on.node, path)
                        }
                        None => true,
                    };
                    if applies {
                        self.plan_selection_set(parent, &inline.node.selection_set.node, path, out);
                    }
                }
            }
        }
    }

    /// Object types only: a fragment applies when it names the parent type.
    fn type_condition_applies(
        &mut self,
        parent: &TypeDescriptor,
        on: &Name,
        path: &FieldPath,
    ) -> bool {
        if on.as_str() == parent.name {
            return true;
        }
        let schema = self.schema;
        match schema.type_of(on.as_str()) {
            Ok(_) => self.error(
                FieldErrorKind::InvalidSelection,
                path.clone(),
                format!("fragment on `{on}` cannot be spread within `{}`", parent.name),
            ),
            Err(e) => self.error(FieldErrorKind::UnknownType, path.clone(), e.to_string()),
        }
        false
    }

    fn plan_field(&mut self, parent: &TypeDescriptor, field: &Field, path: &FieldPath) -> PlannedField {
        let response_key = field.response_key().node.to_string();
        let name = field.name.node.to_string();
        let field_path = path.field(&response_key);

        let mut planned = PlannedField {
            response_key,
            name,
            arguments: Arguments::default(),
            plan: FieldPlan::Invalid,
        };

        if !field.directives.is_empty() {
            self.error(
                FieldErrorKind::InvalidSelection,
                field_path,
                "directives are not supported",
            );
            return planned;
        }

        let has_selection = !field.selection_set.node.items.is_empty();

        if planned.name == TYPENAME {
            if has_selection {
                self.error(
                    FieldErrorKind::InvalidSelection,
                    field_path,
                    "`__typename` has no subfields",
                );
            } else if !field.arguments.is_empty() {
                self.error(
                    FieldErrorKind::InvalidArgument,
                    field_path,
                    "`__typename` takes no arguments",
                );
            } else {
                planned.plan = FieldPlan::Typename;
            }
            return planned;
        }

        let Some(descriptor) = parent.field(&planned.name) else {
            self.error(
                FieldErrorKind::UnknownField,
                field_path,
                format!("cannot query field `{}` on type `{}`", planned.name, parent.name),
            );
            return planned;
        };

        let Some(arguments) = self.coerce_arguments(descriptor, field, &field_path) else {
            return planned;
        };
        planned.arguments = arguments;

        let schema = self.schema;
        let selection = match descriptor.ty.innermost() {
            TypeRef::Named(type_name) => {
                let child = match schema.type_of(type_name) {
                    Ok(child) => child,
                    Err(e) => {
                        self.error(FieldErrorKind::UnknownType, field_path, e.to_string());
                        return planned;
                    }
                };
                if !has_selection {
                    self.error(
                        FieldErrorKind::InvalidSelection,
                        field_path,
                        format!(
                            "field `{}` of type `{}` must have a selection of subfields",
                            planned.name, descriptor.ty
                        ),
                    );
                    return planned;
                }
                let mut selection = Vec::new();
                self.plan_selection_set(child, &field.selection_set.node, &field_path, &mut selection);
                selection
            }
            scalar => {
                if has_selection {
                    self.error(
                        FieldErrorKind::InvalidSelection,
                        field_path,
                        format!("field `{}` of type `{scalar}` has no subfields", planned.name),
                    );
                    return planned;
                }
                Vec::new()
            }
        };

        planned.plan = FieldPlan::Resolve {
            ty: descriptor.ty.clone(),
            selection,
        };
        planned
    }

    /// Coerces the field's arguments, or returns `None` after reporting every
    /// problem found.
    fn coerce_arguments(
        &mut self,
        descriptor: &FieldDescriptor,
        field: &Field,
        path: &FieldPath,
    ) -> Option<Arguments> {
        let mut values = Map::new();
        let mut rejected = HashSet::new();
        let mut valid = true;

        for (name, value) in &field.arguments {
            let name = name.node.as_str();
            let Some(argument) = descriptor.find_argument(name) else {
                self.error(
                    FieldErrorKind::InvalidArgument,
                    path.clone(),
                    format!("unknown argument `{name}` on field `{}`", descriptor.name),
                );
                valid = false;
                continue;
            };

            let resolved = value
                .node
                .clone()
                .into_const_with(|variable| {
                    let json = self.variables.get(variable.as_str()).cloned().unwrap_or(Value::Null);
                    GqlValue::from_json(json)
                })
                .and_then(GqlValue::into_json);

            match resolved.ok().and_then(|json| argument.kind.coerce(&json)) {
                Some(coerced) => {
                    values.insert(name.to_string(), coerced);
                }
                None => {
                    self.error(
                        FieldErrorKind::InvalidArgument,
                        path.clone(),
                        format!("argument `{name}` expects a value of type `{}`", argument.kind),
                    );
                    rejected.insert(name);
                    valid = false;
                }
            }
        }

        let required = descriptor
            .arguments
            .iter()
            .filter(|a| a.required && !rejected.contains(a.name.as_str()));
        for argument in required {
            if values.get(&argument.name).map_or(true, Value::is_null) {
                self.error(
                    FieldErrorKind::InvalidArgument,
                    path.clone(),
                    format!(
                        "missing required argument `{}` of type `{}`",
                        argument.name, argument.kind
                    ),
                );
                valid = false;
            }
        }

        valid.then(|| Arguments::new(values))
    }

    /// Adds `field` to `out`, merging it into an earlier selection with the
    /// same response key.
    fn merge(&mut self, out: &mut Vec<PlannedField>, field: PlannedField, path: &FieldPath) {
        let Some(existing) = out.iter_mut().find(|f| f.response_key == field.response_key) else {
            out.push(field);
            return;
        };

        if existing.name != field.name || existing.arguments != field.arguments {
            self.error(
                FieldErrorKind::InvalidSelection,
                path.field(&field.response_key),
                format!(
                    "`{}` selects different fields or arguments more than once",
                    field.response_key
                ),
            );
            return;
        }

        if let (
            FieldPlan::Resolve { selection: into, .. },
            FieldPlan::Resolve { selection: from, .. },
        ) = (&mut existing.plan, field.plan)
        {
            let child_path = path.field(&field.response_key);
            for child in from {
                self.merge(into, child, &child_path);
            }
        }
    }
}
