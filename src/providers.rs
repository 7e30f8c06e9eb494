//! Provider selection from the configured service type.

use crate::config::{ServiceSettings, ServiceType};
use crate::directions::{DirectionsRequest, DirectionsResponse};
use crate::error::RoutingError;
use crate::haversine::StraightLineDirections;
use crate::ors::{OrsClient, OrsConfig};
use crate::traits::DirectionsProvider;

/// Directions backend named by `directions_service.type`.
#[derive(Debug, Clone)]
pub enum DirectionsService {
    Ors(OrsClient),
    StraightLine(StraightLineDirections),
}

impl DirectionsService {
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, RoutingError> {
        match settings.service_type {
            ServiceType::Ors => Ok(Self::Ors(OrsClient::new(OrsConfig::from(settings))?)),
            ServiceType::StraightLine => Ok(Self::StraightLine(StraightLineDirections::default())),
            ServiceType::None => Err(RoutingError::Configuration(
                "no directions provider configured".to_string(),
            )),
        }
    }
}

impl DirectionsProvider for DirectionsService {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError> {
        match self {
            DirectionsService::Ors(client) => client.directions(request).await,
            DirectionsService::StraightLine(provider) => provider.directions(request).await,
        }
    }
}

/// Only openrouteservice computes isochrones.
pub fn isochrones_from_settings(settings: &ServiceSettings) -> Result<OrsClient, RoutingError> {
    match settings.service_type {
        ServiceType::Ors => OrsClient::new(OrsConfig::from(settings)),
        other => Err(RoutingError::Configuration(format!(
            "isochrones need an ors service, got {other:?}"
        ))),
    }
}
