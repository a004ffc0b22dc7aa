//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use taskdeck_core::{Permission, Role};

/// Print which permissions each role grants, most senior role first.
pub fn print_role_matrix(roles: &[Role]) {
    print!("{:<10}", "Role".bold());
    for permission in Permission::ALL {
        print!(" {:<8}", permission.as_str().bold());
    }
    println!();
    println!("{}", "─".repeat(10 + Permission::ALL.len() * 9));

    for role in roles.iter().rev() {
        print!("{:<10}", role_label(*role));
        for permission in Permission::ALL {
            print!(" {:<8}", mark(role.has_permission(permission)));
        }
        println!();
    }
}

fn role_label(role: Role) -> ColoredString {
    match role {
        Role::Owner => role.as_str().magenta(),
        Role::Editor => role.as_str().cyan(),
        Role::Viewer => role.as_str().normal(),
    }
}

fn mark(granted: bool) -> ColoredString {
    if granted {
        "yes".green()
    } else {
        "no".dimmed()
    }
}
