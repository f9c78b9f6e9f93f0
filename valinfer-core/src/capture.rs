//! Keeping initializers alive across completion parsing
//!
//! In completion mode the host drops a declaration's initializer, and an enhanced for's
//! collection, right after parsing them. These two parser events run just before that happens
//! and stash a second reference on the declaration, where resolution can still find it.
//! Only the shape of the declared type is known at parse time, so the shape test decides.

use crate::capability::Capabilities;
use crate::placeholder::could_be_placeholder;
use valinfer_host::{ForeachStatement, LocalDeclaration};

/// Parser event: a local declaration with an initializer was built
pub fn capture_initializer(capabilities: &Capabilities, declaration: &mut LocalDeclaration) {
    if !could_be_placeholder(&declaration.type_ref) {
        return;
    }
    let Some(initialization) = declaration.initialization.clone() else {
        return;
    };

    if capabilities.try_capture_initializer(declaration, initialization) {
        tracing::trace!(local = %declaration.name.name, "captured initializer");
    }
}

/// Parser event: an enhanced for header was consumed. The collection is stored on the element
/// variable.
pub fn capture_iterable_source(capabilities: &Capabilities, statement: &mut ForeachStatement) {
    if !could_be_placeholder(&statement.element_variable.type_ref) {
        return;
    }
    let Some(collection) = statement.collection.clone() else {
        return;
    };

    let element = &mut statement.element_variable;
    if capabilities.try_capture_iterable_source(element, collection) {
        tracing::trace!(local = %element.name.name, "captured collection");
    }
}
