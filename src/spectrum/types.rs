//! IBM Spectrum Control REST API Type Definitions
//!
//! Rust structs for the JSON documents returned by the Spectrum Control
//! `/srm/REST/api/v1` endpoints.
//!
//! # Design Notes
//!
//! - **Resource records** (storage systems, volumes, switches, pools) are flat
//!   objects whose attribute names contain spaces and whose values are always
//!   strings, some of them numbers with thousands separators. They are
//!   declared through [`resource_record!`] which also generates a
//!   name-to-field lookup ([`Pool::field`]) so configured pool properties can
//!   be projected without runtime introspection.
//! - **Null tolerance**: the API emits `null` for unset attributes; those are
//!   read as empty strings / zero.
//! - **Performance rows** are [`MetricValue`]s; the time-series envelope that
//!   wraps them is decoded by [`ApiGateway`](super::gateway::ApiGateway).

use serde::{Deserialize, Deserializer};

/// Deserializes `null` as the type's default value
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Declares a string-valued resource record with a fixed attribute schema.
///
/// Each `field => "API Name"` pair becomes a `String` field renamed to the API
/// attribute, and the generated `field()` / `FIELD_NAMES` give declarative
/// access by API name.
macro_rules! resource_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $field:ident => $json:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $json, default, deserialize_with = "nullable")]
                pub $field: String,
            )*
        }

        impl $name {
            /// Attribute names exactly as the REST API spells them
            pub const FIELD_NAMES: &'static [&'static str] = &[$($json),*];

            /// Returns the attribute with the given API name, if it is part of the schema
            pub fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $( $json => Some(self.$field.as_str()), )*
                    _ => None,
                }
            }
        }
    };
}

resource_record! {
    /// Storage system from `GET /StorageSystems`
    pub struct StorageSystem {
        allocated_space => "Allocated Space",
        assigned_volume_space => "Assigned Volume Space",
        available_pool_space => "Available Pool Space",
        compressed => "Compressed",
        compression_savings => "Compression Savings",
        custom_tag_1 => "Custom Tag 1",
        custom_tag_2 => "Custom Tag 2",
        custom_tag_3 => "Custom Tag 3",
        data_collection => "Data Collection",
        deduplication_savings => "Deduplication Savings",
        disks => "Disks",
        events => "Events",
        firmware => "Firmware",
        flash_copy => "FlashCopy",
        ip_address => "IP Address",
        location => "Location",
        managed_disks => "Managed Disks",
        model => "Model",
        name => "Name",
        physical_allocation => "Physical Allocation",
        pool_capacity => "Pool Capacity",
        pools => "Pools",
        ports => "Ports",
        raw_disk_capacity => "Raw Disk Capacity",
        read_cache => "Read Cache",
        remote_relationships => "Remote Relationships",
        serial_number => "Serial Number",
        shortfall => "Shortfall",
        time_zone => "Time Zone",
        topology => "Topology",
        total_data_reduction_savings => "Total Data Reduction Savings",
        total_volume_capacity => "Total Volume Capacity",
        turbo_performance => "Turbo Performance",
        system_type => "Type",
        unassigned_volume_space => "Unassigned Volume Space",
        unprotected_volumes => "Unprotected Volumes",
        used_pool_space => "Used Pool Space",
        used_space => "Used Space",
        vdisk_mirrors => "VDisk Mirrors",
        vendor => "Vendor",
        virtual_allocation => "Virtual Allocation",
        volumes => "Volumes",
        write_cache => "Write Cache",
        id => "id",
    }
}

resource_record! {
    /// Volume from `GET /StorageSystems/{id}/Volumes`
    pub struct Volume {
        volume_unique_id => "Volume Unique ID",
        id => "id",
    }
}

resource_record! {
    /// Fibre channel switch from `GET /Switches`
    pub struct Switch {
        acknowledged => "Acknowledged",
        connected_fabrics => "Connected Fabrics",
        connected_ports => "Connected Ports",
        custom_tag_1 => "Custom Tag 1",
        custom_tag_2 => "Custom Tag 2",
        custom_tag_3 => "Custom Tag 3",
        data_source_count => "Data Source Count",
        domain_id => "Domain ID",
        fabric => "Fabric",
        firmware => "Firmware",
        ip_address => "IP Address",
        last_successful_monitor => "Last Successful Monitor",
        last_successful_probe => "Last Successful Probe",
        links => "Links",
        location => "Location",
        mode => "Mode",
        model => "Model",
        name => "Name",
        parent_switch => "Parent Switch",
        performance_monitor_interval_min => "Performance Monitor Interval (min)",
        performance_monitor_status => "Performance Monitor Status",
        ports => "Ports",
        principal_switch_of_fabric => "Principal Switch of Fabric",
        probe_schedule => "Probe Schedule",
        probe_status => "Probe Status",
        serial_number => "Serial Number",
        status => "Status",
        vendor => "Vendor",
        is_virtual => "Virtual",
        wwn => "WWN",
        id => "id",
    }
}

resource_record! {
    /// Storage pool from `GET /Pools`
    pub struct Pool {
        acknowledged => "Acknowledged",
        activity => "Activity",
        allocated_space => "Allocated Space",
        assigned_volume_space => "Assigned Volume Space",
        available_pool_space => "Available Pool Space",
        available_repository_space => "Available Repository Space",
        available_soft_space => "Available Soft Space",
        back_end_storage_disk_type => "Back-end Storage Disk Type",
        back_end_storage_disks => "Back-end Storage Disks",
        back_end_storage_raid_level => "Back-end Storage RAID Level",
        back_end_storage_system_type => "Back-end Storage System Type",
        capacity => "Capacity",
        capacity_pool => "Capacity Pool",
        compression_savings => "Compression Savings",
        custom_tag_1 => "Custom Tag 1",
        custom_tag_2 => "Custom Tag 2",
        custom_tag_3 => "Custom Tag 3",
        deduplication_savings => "Deduplication Savings",
        easy_tier => "Easy Tier",
        encryption => "Encryption",
        encryption_group => "Encryption Group",
        enterprise_hdd_available_space => "Enterprise HDD Available Space",
        enterprise_hdd_capacity => "Enterprise HDD Capacity",
        extent_size => "Extent Size",
        format => "Format",
        lss_or_lcu => "LSS or LCU",
        last_data_collection => "Last Data Collection",
        managed_disks => "Managed Disks",
        name => "Name",
        nearline_hdd_available_space => "Nearline HDD Available Space",
        nearline_hdd_capacity => "Nearline HDD Capacity",
        owner_name => "Owner Name",
        parent_name => "Parent Name",
        physical_allocation => "Physical Allocation",
        pool_attributes => "Pool Attributes",
        raid_level => "RAID Level",
        rank_group => "Rank Group",
        repository_capacity => "Repository Capacity",
        reserved_pool_space => "Reserved Pool Space",
        shortfall => "Shortfall",
        soft_space => "Soft Space",
        solid_state => "Solid State",
        status => "Status",
        storage_system => "Storage System",
        tier => "Tier",
        tier0_flash_available_space => "Tier 0 Flash Available Space",
        tier0_flash_capacity => "Tier 0 Flash Capacity",
        tier1_flash_available_space => "Tier 1 Flash Available Space",
        tier1_flash_capacity => "Tier 1 Flash Capacity",
        total_data_reduction_savings => "Total Data Reduction Savings",
        total_volume_capacity => "Total Volume Capacity",
        unallocatable_volume_space => "Unallocatable Volume Space",
        unallocated_volume_space => "Unallocated Volume Space",
        unassigned_volume_space => "Unassigned Volume Space",
        unreserved_pool_space => "Unreserved Pool Space",
        unused_space => "Unused Space",
        used_space => "Used Space",
        virtual_allocation => "Virtual Allocation",
        volumes => "Volumes",
        zero_capacity => "Zero Capacity",
        id => "id",
    }
}

/// One `(x, y)` point of a performance series; `y` is `null` when the
/// interval has no reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch
    pub x: i64,
    #[serde(default)]
    pub y: Option<f64>,
}

/// Performance series for one metric on one device
///
/// Returned as the data rows (index 1..) of the `*/Performance` envelopes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    /// Samples ordered oldest to newest
    #[serde(default, deserialize_with = "nullable")]
    pub current: Vec<Sample>,
    #[serde(default, deserialize_with = "nullable")]
    pub device_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub device_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, deserialize_with = "nullable")]
    pub max_value: f64,
    pub metric_id: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub min_value: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_device_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub precision: i32,
    #[serde(rename = "resourceID", default, deserialize_with = "nullable")]
    pub resource_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub units: String,
}

impl MetricValue {
    /// Newest sample that carries a value, scanning backwards from the end
    pub fn latest_present(&self) -> Option<(i64, f64)> {
        self.current
            .iter()
            .rev()
            .find_map(|sample| sample.y.map(|y| (sample.x, y)))
    }
}
