use serde::{Deserialize, Serialize};

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Customer,
    Employee,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "CUSTOMER",
            UserRole::Employee => "EMPLOYEE",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Acepta también la forma `ROLE_EMPLOYEE` de Spring Security
    pub fn parse(s: &str) -> Option<Self> {
        let role = s.trim();
        let role = role.strip_prefix("ROLE_").unwrap_or(role);
        match role.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(UserRole::Customer),
            "EMPLOYEE" => Some(UserRole::Employee),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Personal que ejecuta confirmación, entrega y devolución
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Employee | UserRole::Admin)
    }
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // username
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    pub exp: usize, // expiration timestamp
    pub iat: usize, // issued at timestamp
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: UserRole,
    /// Solo para clientes: el registro de cliente asociado
    pub customer_id: Option<i64>,
}

impl AuthenticatedUser {
    pub fn staff(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: UserRole::Employee,
            customer_id: None,
        }
    }

    pub fn customer(username: impl Into<String>, customer_id: i64) -> Self {
        Self {
            username: username.into(),
            role: UserRole::Customer,
            customer_id: Some(customer_id),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// El personal actúa por cualquier cliente; un cliente solo por sí mismo
    pub fn can_act_for(&self, customer_id: i64) -> bool {
        self.is_staff() || self.customer_id == Some(customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_and_plain_roles() {
        assert_eq!(UserRole::parse("ROLE_EMPLOYEE"), Some(UserRole::Employee));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("CUSTOMER"), Some(UserRole::Customer));
        assert_eq!(UserRole::parse("livreur"), None);
    }

    #[test]
    fn customers_only_act_for_themselves() {
        let customer = AuthenticatedUser::customer("anna", 4);
        assert!(customer.can_act_for(4));
        assert!(!customer.can_act_for(5));
        assert!(AuthenticatedUser::staff("tom").can_act_for(5));
    }
}
