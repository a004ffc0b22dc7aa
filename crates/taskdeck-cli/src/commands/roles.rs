//! Role matrix command.

use taskdeck_core::Role;

use crate::output;

pub fn execute() {
    output::print_role_matrix(&Role::ALL);
}
