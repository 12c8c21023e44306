pub mod application_dto;
pub mod csv_dto;
pub mod topology_dto;
