use graphql_parser::query::{
    Definition, Directive, Document, OperationDefinition, Query, Selection, SelectionSet, Value,
    VariableDefinition,
};

pub fn operation_name<'a>(operation: &'a OperationDefinition<'static, String>) -> Option<&'a str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => q.name.as_deref(),
        OperationDefinition::Mutation(m) => m.name.as_deref(),
        OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

/// Renames the operation. A query shorthand is turned into a `query` so it can carry the name.
pub fn set_operation_name(operation: &mut OperationDefinition<'static, String>, name: Option<String>) {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => {
            if name.is_none() {
                return;
            }
            let span = selection_set.span;
            let selection_set = std::mem::replace(
                selection_set,
                SelectionSet {
                    span,
                    items: Vec::new(),
                },
            );
            *operation = OperationDefinition::Query(Query {
                position: selection_set.span.0,
                name,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set,
            });
        }
        OperationDefinition::Query(q) => q.name = name,
        OperationDefinition::Mutation(m) => m.name = name,
        OperationDefinition::Subscription(s) => s.name = name,
    }
}

pub fn selection_set<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> &'a SelectionSet<'static, String> {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => selection_set,
        OperationDefinition::Query(q) => &q.selection_set,
        OperationDefinition::Mutation(m) => &m.selection_set,
        OperationDefinition::Subscription(s) => &s.selection_set,
    }
}

pub fn selection_set_mut<'a>(
    operation: &'a mut OperationDefinition<'static, String>,
) -> &'a mut SelectionSet<'static, String> {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => selection_set,
        OperationDefinition::Query(q) => &mut q.selection_set,
        OperationDefinition::Mutation(m) => &mut m.selection_set,
        OperationDefinition::Subscription(s) => &mut s.selection_set,
    }
}

pub fn variable_definitions<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> &'a [VariableDefinition<'static, String>] {
    match operation {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(q) => &q.variable_definitions,
        OperationDefinition::Mutation(m) => &m.variable_definitions,
        OperationDefinition::Subscription(s) => &s.variable_definitions,
    }
}

/// `None` for a query shorthand, which cannot declare variables.
pub fn variable_definitions_mut<'a>(
    operation: &'a mut OperationDefinition<'static, String>,
) -> Option<&'a mut Vec<VariableDefinition<'static, String>>> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => Some(&mut q.variable_definitions),
        OperationDefinition::Mutation(m) => Some(&mut m.variable_definitions),
        OperationDefinition::Subscription(s) => Some(&mut s.variable_definitions),
    }
}

pub fn operation_directives<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> &'a [Directive<'static, String>] {
    match operation {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(q) => &q.directives,
        OperationDefinition::Mutation(m) => &m.directives,
        OperationDefinition::Subscription(s) => &s.directives,
    }
}

pub fn operations<'a>(
    document: &'a Document<'static, String>,
) -> impl Iterator<Item = &'a OperationDefinition<'static, String>> {
    document.definitions.iter().filter_map(|definition| match definition {
        Definition::Operation(operation) => Some(operation),
        Definition::Fragment(_) => None,
    })
}

pub fn first_operation_mut<'a>(
    document: &'a mut Document<'static, String>,
) -> Option<&'a mut OperationDefinition<'static, String>> {
    document
        .definitions
        .iter_mut()
        .find_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
}

pub fn first_operation<'a>(
    document: &'a Document<'static, String>,
) -> Option<&'a OperationDefinition<'static, String>> {
    operations(document).next()
}

/// Calls `f` with the name of every variable referenced by `value`.
pub fn visit_variables<'a>(value: &'a Value<'static, String>, f: &mut impl FnMut(&'a str)) {
    match value {
        Value::Variable(name) => f(name),
        Value::List(items) => items.iter().for_each(|item| visit_variables(item, f)),
        Value::Object(fields) => fields.values().for_each(|item| visit_variables(item, f)),
        _ => {}
    }
}

pub fn contains_variable(value: &Value<'static, String>) -> bool {
    let mut found = false;
    visit_variables(value, &mut |_| found = true);
    found
}

/// Calls `f` with every directive found in the selection set, recursively.
pub fn visit_directives<'a>(
    selection_set: &'a SelectionSet<'static, String>,
    f: &mut impl FnMut(&'a Directive<'static, String>),
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                field.directives.iter().for_each(&mut *f);
                visit_directives(&field.selection_set, f);
            }
            Selection::FragmentSpread(spread) => {
                spread.directives.iter().for_each(&mut *f);
            }
            Selection::InlineFragment(fragment) => {
                fragment.directives.iter().for_each(&mut *f);
                visit_directives(&fragment.selection_set, f);
            }
        }
    }
}
