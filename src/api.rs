pub mod geo_dto;
pub mod request_dto;
pub mod schedule_dto;
