//! Retrieval of the canonical term list and the optional alias rows.
//!
//! Both lookups are best effort: a single attempt, no retry. When the term list
//! cannot be fetched the built-in Simple Darwin Core list is used; when the
//! alias source is missing or unreadable there are simply no alias rows.

use std::{env, fs, path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::io_utils;

pub const DEFAULT_TERMS_URL: &str =
    "https://raw.githubusercontent.com/tdwg/dwc/master/dist/simple_dwc_horizontal.csv";
pub const TERMS_URL_ENV: &str = "DWC_HELPER_TERMS_URL";
pub const ALIASES_ENV: &str = "DWC_HELPER_ALIASES";
pub const OFFLINE_ENV: &str = "DWC_HELPER_OFFLINE";

const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("dwc-helper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub terms_url: String,
    /// URL or local path of the alias CSV.
    pub aliases: Option<String>,
    pub offline: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            terms_url: DEFAULT_TERMS_URL.to_string(),
            aliases: None,
            offline: false,
        }
    }
}

impl SourceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            terms_url: non_empty(TERMS_URL_ENV).unwrap_or_else(|| DEFAULT_TERMS_URL.to_string()),
            aliases: non_empty(ALIASES_ENV),
            offline: non_empty(OFFLINE_ENV).is_some_and(|v| v != "0"),
        }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn http_get(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .context("Building HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Requesting {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("{url} answered with status {status}");
    }
    response
        .text()
        .with_context(|| format!("Reading response body from {url}"))
}

fn read_location(location: &str) -> Result<String> {
    if is_remote(location) {
        http_get(location)
    } else {
        fs::read_to_string(Path::new(location))
            .with_context(|| format!("Reading alias file {location:?}"))
    }
}

fn parse_records(body: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = io_utils::open_csv_reader(body.as_bytes(), true);
    io_utils::read_all_records(&mut reader)
}

/// The first record of `body`, without blank fields.
pub fn parse_term_list(body: &str) -> Result<Vec<String>> {
    let terms = parse_records(body)?
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>();
    if terms.is_empty() {
        bail!("Term list is empty");
    }
    Ok(terms)
}

/// Alias rows of `body`; rows without at least a term and one variant are dropped.
pub fn parse_alias_rows(body: &str) -> Result<Vec<Vec<String>>> {
    Ok(parse_records(body)?
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|field| field.trim().to_string())
                .filter(|field| !field.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|row| row.len() >= 2)
        .collect())
}

pub fn fetch_terms(config: &SourceConfig) -> Vec<String> {
    if config.offline {
        debug!("Offline: using the built-in term list");
        return builtin_terms();
    }
    match http_get(&config.terms_url).and_then(|body| parse_term_list(&body)) {
        Ok(terms) => {
            info!("Fetched {} term(s) from {}", terms.len(), config.terms_url);
            terms
        }
        Err(err) => {
            warn!("Using the built-in term list: {err:#}");
            builtin_terms()
        }
    }
}

pub fn fetch_aliases(config: &SourceConfig) -> Vec<Vec<String>> {
    let Some(location) = config.aliases.as_deref() else {
        return Vec::new();
    };
    if config.offline && is_remote(location) {
        debug!("Offline: skipping alias source {location}");
        return Vec::new();
    }
    match read_location(location).and_then(|body| parse_alias_rows(&body)) {
        Ok(rows) => {
            info!("Loaded {} alias row(s) from {location}", rows.len());
            rows
        }
        Err(err) => {
            warn!("Continuing without aliases: {err:#}");
            Vec::new()
        }
    }
}

pub fn builtin_terms() -> Vec<String> {
    BUILTIN_TERMS.iter().map(|term| term.to_string()).collect()
}

const BUILTIN_TERMS: &[&str] = &[
    "type",
    "modified",
    "language",
    "license",
    "rightsHolder",
    "accessRights",
    "bibliographicCitation",
    "references",
    "institutionID",
    "collectionID",
    "datasetID",
    "institutionCode",
    "collectionCode",
    "datasetName",
    "ownerInstitutionCode",
    "basisOfRecord",
    "informationWithheld",
    "dataGeneralizations",
    "dynamicProperties",
    "occurrenceID",
    "catalogNumber",
    "recordNumber",
    "recordedBy",
    "recordedByID",
    "individualCount",
    "organismQuantity",
    "organismQuantityType",
    "sex",
    "lifeStage",
    "reproductiveCondition",
    "behavior",
    "establishmentMeans",
    "degreeOfEstablishment",
    "pathway",
    "georeferenceVerificationStatus",
    "occurrenceStatus",
    "preparations",
    "disposition",
    "associatedMedia",
    "associatedOccurrences",
    "associatedReferences",
    "associatedSequences",
    "associatedTaxa",
    "otherCatalogNumbers",
    "occurrenceRemarks",
    "organismID",
    "organismName",
    "organismScope",
    "associatedOrganisms",
    "previousIdentifications",
    "organismRemarks",
    "materialSampleID",
    "eventID",
    "parentEventID",
    "fieldNumber",
    "eventDate",
    "eventTime",
    "startDayOfYear",
    "endDayOfYear",
    "year",
    "month",
    "day",
    "verbatimEventDate",
    "habitat",
    "samplingProtocol",
    "sampleSizeValue",
    "sampleSizeUnit",
    "samplingEffort",
    "fieldNotes",
    "eventRemarks",
    "locationID",
    "higherGeographyID",
    "higherGeography",
    "continent",
    "waterBody",
    "islandGroup",
    "island",
    "country",
    "countryCode",
    "stateProvince",
    "county",
    "municipality",
    "locality",
    "verbatimLocality",
    "minimumElevationInMeters",
    "maximumElevationInMeters",
    "verbatimElevation",
    "verticalDatum",
    "minimumDepthInMeters",
    "maximumDepthInMeters",
    "verbatimDepth",
    "minimumDistanceAboveSurfaceInMeters",
    "maximumDistanceAboveSurfaceInMeters",
    "locationAccordingTo",
    "locationRemarks",
    "decimalLatitude",
    "decimalLongitude",
    "geodeticDatum",
    "coordinateUncertaintyInMeters",
    "coordinatePrecision",
    "pointRadiusSpatialFit",
    "verbatimCoordinates",
    "verbatimLatitude",
    "verbatimLongitude",
    "verbatimCoordinateSystem",
    "verbatimSRS",
    "footprintWKT",
    "footprintSRS",
    "footprintSpatialFit",
    "georeferencedBy",
    "georeferencedDate",
    "georeferenceProtocol",
    "georeferenceSources",
    "georeferenceRemarks",
    "geologicalContextID",
    "earliestEonOrLowestEonothem",
    "latestEonOrHighestEonothem",
    "earliestEraOrLowestErathem",
    "latestEraOrHighestErathem",
    "earliestPeriodOrLowestSystem",
    "latestPeriodOrHighestSystem",
    "earliestEpochOrLowestSeries",
    "latestEpochOrHighestSeries",
    "earliestAgeOrLowestStage",
    "latestAgeOrHighestStage",
    "lowestBiostratigraphicZone",
    "highestBiostratigraphicZone",
    "lithostratigraphicTerms",
    "group",
    "formation",
    "member",
    "bed",
    "identificationID",
    "verbatimIdentification",
    "identificationQualifier",
    "typeStatus",
    "identifiedBy",
    "identifiedByID",
    "dateIdentified",
    "identificationReferences",
    "identificationVerificationStatus",
    "identificationRemarks",
    "taxonID",
    "scientificNameID",
    "acceptedNameUsageID",
    "parentNameUsageID",
    "originalNameUsageID",
    "nameAccordingToID",
    "namePublishedInID",
    "taxonConceptID",
    "scientificName",
    "acceptedNameUsage",
    "parentNameUsage",
    "originalNameUsage",
    "nameAccordingTo",
    "namePublishedIn",
    "namePublishedInYear",
    "higherClassification",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "subfamily",
    "genus",
    "genericName",
    "subgenus",
    "infragenericEpithet",
    "specificEpithet",
    "infraspecificEpithet",
    "cultivarEpithet",
    "taxonRank",
    "verbatimTaxonRank",
    "scientificNameAuthorship",
    "vernacularName",
    "nomenclaturalCode",
    "taxonomicStatus",
    "nomenclaturalStatus",
    "taxonRemarks",
];
