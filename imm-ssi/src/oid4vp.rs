// Copyright (C) 2020-2025  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! OID4VP presentation requests and responses.

use bherror::{traits::PropagateError as _, Error, Result};
use imm_oid4vc::{
    scenarios, Completion, PresentationDefinition, PresentationRequest, PresentationResponse,
    PresentationVerificationResult, Scenario, ScenarioSummary, RESPONSE_PATH, VP_TOKEN,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ServiceError, SsiService};

/// A verifier's request for a presentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationRequest {
    /// A predefined scenario, e.g. `f1-status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// A custom definition, used when no known scenario is named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_definition: Option<PresentationDefinition>,
}

/// Whether a presentation request has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationState {
    /// Waiting for the wallet.
    Pending,
    /// A verdict is available.
    Completed,
}

/// The state of a presentation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationStatus {
    /// The request state.
    pub state: String,
    /// Pending or completed.
    pub status: PresentationState,
    /// The latest verdict.
    pub result: Option<PresentationVerificationResult>,
}

impl SsiService {
    /// Creates a presentation request from a scenario or a custom definition.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] if neither a known scenario nor a
    /// definition is given.
    pub fn create_presentation_request(
        &self,
        request: CreatePresentationRequest,
    ) -> Result<PresentationRequest, ServiceError> {
        let definition = request
            .scenario
            .as_deref()
            .and_then(Scenario::from_id)
            .map(Scenario::definition)
            .or(request.presentation_definition);
        let Some(definition) = definition else {
            return Err(Error::root(ServiceError::Validation(
                "Either scenario or presentationDefinition is required".to_owned(),
            )));
        };

        let created = self
            .presentations
            .create_request(definition.clone())
            .with_err(|| ServiceError::Internal)?;

        Ok(PresentationRequest {
            response_type: VP_TOKEN.to_owned(),
            presentation_definition: definition,
            nonce: created.nonce,
            response_uri: Some(format!("{}{RESPONSE_PATH}", self.config.base_url())),
            state: Some(created.state),
        })
    }

    /// Verifies a wallet response and records the verdict under its state.
    ///
    /// The verdict is returned even if the state is unknown or expired.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] if the response has no `vp_token`.
    pub async fn receive_presentation(
        &self,
        response: &PresentationResponse,
    ) -> Result<PresentationVerificationResult, ServiceError> {
        if response.vp_token.trim().is_empty() {
            return Err(Error::root(ServiceError::Validation(
                "vp_token is required".to_owned(),
            )));
        }

        let verification = self.verify(response.vp_token.trim()).await;
        let result = PresentationVerificationResult::new(
            verification,
            response
                .presentation_submission
                .as_ref()
                .map(|submission| submission.definition_id.clone()),
        );

        if let Some(state) = response.state.as_deref().filter(|s| !s.is_empty()) {
            let completion = self.presentations.complete_request(state, result.clone());
            if completion == Completion::Replaced {
                debug!(state, "presentation verdict replaced");
            }
        }

        Ok(result)
    }

    /// The status of the presentation request of `state`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the request is unknown or expired.
    pub fn presentation_status(&self, state: &str) -> Result<PresentationStatus, ServiceError> {
        let Some(pending) = self.presentations.get_request(state) else {
            return Err(Error::root(ServiceError::NotFound(
                "Presentation request not found or expired".to_owned(),
            )));
        };

        Ok(PresentationStatus {
            status: if pending.is_completed() {
                PresentationState::Completed
            } else {
                PresentationState::Pending
            },
            state: pending.state,
            result: pending.result,
        })
    }

    /// The predefined presentation scenarios.
    pub fn presentation_scenarios(&self) -> Vec<ScenarioSummary> {
        scenarios()
    }
}
