#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Role {
    Admin,
    Creator,
    Visitor,
}

impl Role {
    pub fn parse(role: String) -> Result<Role, String> {
        match role.as_str() {
            "Admin" => Ok(Role::Admin),
            "Creator" => Ok(Role::Creator),
            "Visitor" => Ok(Role::Visitor),
            _ => Err(format!("{} is not a valid user role", role)),
        }
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::Creator => "Creator",
            Role::Visitor => "Visitor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
