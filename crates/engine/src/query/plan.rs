use std::collections::BTreeSet;

use cynic_parser::{
    common::OperationType,
    executable::{iter::Iter, Argument, Directive, OperationDefinition, Selection as AstSelection},
    ExecutableDocument,
};

use crate::error::QueryError;

pub(crate) const CLIENT_DIRECTIVE: &str = "client";
pub(crate) const TYPENAME: &str = "__typename";

/// Where the value of a field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldSource {
    /// Part of the network subset.
    Network,
    /// Marked `@client`, computed by a registered resolver.
    Client,
    /// Nested below a `@client` field, taken out of the value its ancestor resolved to.
    Projected,
    /// Unmarked, but without any network leaf below it. Built from its children.
    Local,
}

#[derive(Debug, Clone)]
pub(crate) enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
}

#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub name: String,
    pub alias: Option<String>,
    /// Printed arguments, empty when the field has none.
    pub arguments: String,
    /// Printed directives. Always empty for fields that never reach the network.
    pub directives: String,
    pub source: FieldSource,
    /// Variables referenced by the arguments and directives of a network field.
    pub variables: Vec<String>,
    pub selection_set: Vec<Selection>,
}

impl Field {
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: String,
    pub variables: Vec<String>,
    pub selection_set: Vec<Selection>,
}

/// Owned view of the selected operation, with fragment spreads inlined and every field
/// classified by where its value comes from.
#[derive(Debug)]
pub(crate) struct QueryPlan {
    pub operation_name: Option<String>,
    /// Printed definitions of the variables the network subset references.
    pub variable_definitions: Vec<String>,
    /// Names of those variables. The others only reach client resolvers.
    pub network_variables: BTreeSet<String>,
    pub selection_set: Vec<Selection>,
    /// Dotted field paths of every `@client` field, in document order.
    pub client_paths: Vec<String>,
}

impl QueryPlan {
    pub fn build(document: &ExecutableDocument, operation_name: Option<&str>) -> Result<Self, QueryError> {
        let operation = select_operation(document, operation_name)?;

        match operation.operation_type() {
            OperationType::Query => {}
            OperationType::Mutation => return Err(QueryError::UnsupportedOperation("mutation")),
            OperationType::Subscription => return Err(QueryError::UnsupportedOperation("subscription")),
        }

        let mut planner = Planner {
            document,
            fragment_stack: Vec::new(),
        };
        let selection_set = planner.build_selection_set(operation.selection_set(), false)?;

        let mut client_paths = Vec::new();
        collect_client_paths(&selection_set, &mut Vec::new(), &mut client_paths);

        let mut network_variables = BTreeSet::new();
        collect_network_variables(&selection_set, &mut network_variables);

        Ok(QueryPlan {
            operation_name: operation.name().map(str::to_string),
            variable_definitions: operation
                .variable_definitions()
                .filter(|definition| network_variables.contains(definition.name()))
                .map(|definition| definition.to_string())
                .collect(),
            network_variables,
            selection_set,
            client_paths,
        })
    }

    pub fn has_network_fields(&self) -> bool {
        has_network_leaf(&self.selection_set)
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<OperationDefinition<'a>, QueryError> {
    match operation_name {
        Some(name) => document
            .operations()
            .find(|operation| operation.name() == Some(name))
            .ok_or_else(|| QueryError::UnknownOperation(name.to_string())),
        None => {
            let mut operations = document.operations();
            let operation = operations.next().ok_or(QueryError::MissingOperation)?;
            if operations.next().is_some() {
                return Err(QueryError::AmbiguousOperation);
            }
            Ok(operation)
        }
    }
}

struct Planner<'doc> {
    document: &'doc ExecutableDocument,
    fragment_stack: Vec<&'doc str>,
}

impl<'doc> Planner<'doc> {
    fn build_selection_set(
        &mut self,
        selections: Iter<'doc, AstSelection<'doc>>,
        inside_client: bool,
    ) -> Result<Vec<Selection>, QueryError> {
        let mut output = Vec::with_capacity(selections.len());

        for selection in selections {
            match selection {
                AstSelection::Field(field) => {
                    let marked = field
                        .directives()
                        .any(|directive| directive.name() == CLIENT_DIRECTIVE);
                    let selection_set = self.build_selection_set(field.selection_set(), inside_client || marked)?;

                    let source = if inside_client {
                        FieldSource::Projected
                    } else if marked {
                        FieldSource::Client
                    } else if !selection_set.is_empty() && !has_network_leaf(&selection_set) {
                        FieldSource::Local
                    } else {
                        FieldSource::Network
                    };

                    let (directives, variables) = match source {
                        FieldSource::Network => (
                            field.directives().to_string(),
                            variables_used(field.arguments(), field.directives()),
                        ),
                        _ => (String::new(), Vec::new()),
                    };

                    output.push(Selection::Field(Field {
                        name: field.name().to_string(),
                        alias: field.alias().map(str::to_string),
                        arguments: field.arguments().to_string(),
                        directives,
                        source,
                        variables,
                        selection_set,
                    }));
                }
                AstSelection::InlineFragment(fragment) => {
                    let selection_set = self.build_selection_set(fragment.selection_set(), inside_client)?;

                    output.push(Selection::InlineFragment(InlineFragment {
                        type_condition: fragment.type_condition().map(str::to_string),
                        directives: fragment.directives().to_string(),
                        variables: variables_used(std::iter::empty(), fragment.directives()),
                        selection_set,
                    }));
                }
                AstSelection::FragmentSpread(spread) => {
                    let name = spread.fragment_name();

                    if self.fragment_stack.contains(&name) {
                        return Err(QueryError::FragmentCycle(name.to_string()));
                    }

                    let fragment = self
                        .document
                        .fragments()
                        .find(|fragment| fragment.name() == name)
                        .ok_or_else(|| QueryError::UnknownFragment(name.to_string()))?;

                    self.fragment_stack.push(name);
                    let selection_set = self.build_selection_set(fragment.selection_set(), inside_client)?;
                    self.fragment_stack.pop();

                    output.push(Selection::InlineFragment(InlineFragment {
                        type_condition: Some(fragment.type_condition().to_string()),
                        directives: spread.directives().to_string(),
                        variables: variables_used(std::iter::empty(), spread.directives()),
                        selection_set,
                    }));
                }
            }
        }

        Ok(output)
    }
}

pub(crate) fn has_network_leaf(selection_set: &[Selection]) -> bool {
    selection_set.iter().any(|selection| match selection {
        Selection::Field(field) => field.source == FieldSource::Network,
        Selection::InlineFragment(fragment) => has_network_leaf(&fragment.selection_set),
    })
}

fn variables_used<'a>(
    arguments: impl Iterator<Item = Argument<'a>>,
    directives: Iter<'a, Directive<'a>>,
) -> Vec<String> {
    let mut output = Vec::new();

    for argument in arguments.chain(directives.flat_map(|directive| directive.arguments())) {
        output.extend(argument.value().variables_used().map(str::to_string));
    }

    output
}

/// Mirrors what the printer keeps: network fields and the fragments holding them.
fn collect_network_variables(selection_set: &[Selection], output: &mut BTreeSet<String>) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                if field.source == FieldSource::Network {
                    output.extend(field.variables.iter().cloned());
                    collect_network_variables(&field.selection_set, output);
                }
            }
            Selection::InlineFragment(fragment) => {
                if has_network_leaf(&fragment.selection_set) {
                    output.extend(fragment.variables.iter().cloned());
                    collect_network_variables(&fragment.selection_set, output);
                }
            }
        }
    }
}

fn collect_client_paths<'a>(selection_set: &'a [Selection], path: &mut Vec<&'a str>, output: &mut Vec<String>) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                path.push(&field.name);
                match field.source {
                    FieldSource::Client => output.push(path.join(".")),
                    FieldSource::Projected => {}
                    FieldSource::Network | FieldSource::Local => {
                        collect_client_paths(&field.selection_set, path, output);
                    }
                }
                path.pop();
            }
            Selection::InlineFragment(fragment) => collect_client_paths(&fragment.selection_set, path, output),
        }
    }
}
