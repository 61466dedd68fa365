pub mod pagination;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use crate::types::{ApiResponse, Health};

    #[test]
    fn health_type_ok() {
        let h = Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn envelope_ok_carries_data() {
        let resp = ApiResponse::ok(42u32);
        assert!(resp.success);
        assert_eq!(resp.data, Some(42));
    }
}
