use std::fmt::{self, Write as _};

use super::plan::{has_network_leaf, FieldSource, QueryPlan, Selection, TYPENAME};

/// Prints the part of the query the network has to resolve.
///
/// The operation name is left out on purpose: the output is part of the deduplication key and
/// two operations that only differ by name must share it.
pub(crate) fn network_query(plan: &QueryPlan) -> Option<String> {
    if !plan.has_network_fields() {
        return None;
    }

    let mut output = String::from("query");

    if !plan.variable_definitions.is_empty() {
        output.push('(');
        output.push_str(&plan.variable_definitions.join(", "));
        output.push(')');
    }

    // Writing into a String cannot fail.
    let _ = writeln!(
        output,
        " {}",
        NetworkSelectionSet {
            selection_set: &plan.selection_set,
            indent_level: 0,
        }
    );

    Some(output)
}

macro_rules! write_indent {
    ($f:expr, $level:expr) => {
        write!($f, "{:indent$}", "", indent = $level * 2)
    };
}

struct NetworkSelectionSet<'a> {
    selection_set: &'a [Selection],
    indent_level: usize,
}

impl<'a> NetworkSelectionSet<'a> {
    fn visible(&self) -> impl Iterator<Item = &'a Selection> + 'a {
        self.selection_set.iter().filter(|selection| match selection {
            Selection::Field(field) => field.source == FieldSource::Network,
            Selection::InlineFragment(fragment) => has_network_leaf(&fragment.selection_set),
        })
    }

    /// Type conditions are checked against `__typename`, the network has to return it.
    fn needs_typename(&self) -> bool {
        let has_type_condition = self.selection_set.iter().any(|selection| {
            matches!(selection, Selection::InlineFragment(fragment) if fragment.type_condition.is_some())
        });

        has_type_condition
            && !self.selection_set.iter().any(|selection| {
                matches!(
                    selection,
                    Selection::Field(field)
                        if field.name == TYPENAME && field.alias.is_none() && field.source == FieldSource::Network
                )
            })
    }

    fn nested(&self, selection_set: &'a [Selection]) -> NetworkSelectionSet<'a> {
        NetworkSelectionSet {
            selection_set,
            indent_level: self.indent_level + 1,
        }
    }
}

impl fmt::Display for NetworkSelectionSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;

        if self.needs_typename() {
            write_indent!(f, self.indent_level + 1)?;
            writeln!(f, "{TYPENAME}")?;
        }

        for selection in self.visible() {
            write_indent!(f, self.indent_level + 1)?;

            match selection {
                Selection::Field(field) => {
                    if let Some(alias) = &field.alias {
                        write!(f, "{alias}: ")?;
                    }

                    write!(f, "{}{}{}", field.name, field.arguments, field.directives)?;

                    if !field.selection_set.is_empty() {
                        write!(f, " {}", self.nested(&field.selection_set))?;
                    }
                }
                Selection::InlineFragment(fragment) => {
                    write!(f, "...")?;

                    if let Some(on_type) = &fragment.type_condition {
                        write!(f, " on {on_type}")?;
                    }

                    write!(f, "{} {}", fragment.directives, self.nested(&fragment.selection_set))?;
                }
            }

            writeln!(f)?;
        }

        write_indent!(f, self.indent_level)?;
        write!(f, "}}")
    }
}
