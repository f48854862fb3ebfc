use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub join_code: Option<String>, // UNIQUE; exactly one valid code at a time
    pub require_join_approval: bool,
    pub subscription_id: Option<String>, // owned by the payment collaborator
}
