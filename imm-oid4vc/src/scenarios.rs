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

//! Predefined presentation definitions for common immigration checks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    Constraints, FieldConstraint, FormatRequirement, InputDescriptor, PresentationDefinition,
};

const TYPE_PATH: &str = "$.vc.type";
const ACCEPTED_ALGORITHMS: [&str; 2] = ["EdDSA", "HS256"];

/// A predefined verification scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// F-1 student status from an I-20.
    F1Status,
    /// Funding of studies.
    FinancialSupport,
    /// Nationality and passport validity, without the document number.
    PassportIdentity,
    /// J-1 exchange visitor status from a DS-2019.
    J1Status,
    /// Current admission from an I-94.
    AdmissionStatus,
}

/// The listing entry of a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    /// Scenario id, accepted by [`Scenario::from_id`].
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// What the scenario proves.
    pub description: &'static str,
}

struct Layout {
    definition_id: &'static str,
    definition_name: &'static str,
    purpose: &'static str,
    descriptor_id: &'static str,
    descriptor_name: &'static str,
    descriptor_purpose: &'static str,
    credential_type: &'static str,
    fields: &'static [&'static str],
}

impl Scenario {
    /// Every scenario, in listing order.
    pub const ALL: [Scenario; 5] = [
        Scenario::F1Status,
        Scenario::FinancialSupport,
        Scenario::PassportIdentity,
        Scenario::J1Status,
        Scenario::AdmissionStatus,
    ];

    /// Looks a scenario up by its id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scenario| scenario.id() == id)
    }

    /// The scenario id.
    pub fn id(self) -> &'static str {
        self.summary().id
    }

    /// The listing entry.
    pub fn summary(self) -> ScenarioSummary {
        let (id, name, description) = match self {
            Self::F1Status => (
                "f1-status",
                "Prove F-1 Student Status",
                "Verify valid F-1 enrollment via I-20 credential",
            ),
            Self::FinancialSupport => (
                "financial-support",
                "Prove Financial Support",
                "Verify sufficient funding for studies",
            ),
            Self::PassportIdentity => (
                "passport-identity",
                "Verify Passport Identity",
                "Verify nationality and passport validity without exposing document number",
            ),
            Self::J1Status => (
                "j1-status",
                "Prove J-1 Status",
                "Verify J-1 exchange visitor status via DS-2019 credential",
            ),
            Self::AdmissionStatus => (
                "admission-status",
                "Verify Admission Status",
                "Verify current admission status and class of admission via I-94",
            ),
        };

        ScenarioSummary {
            id,
            name,
            description,
        }
    }

    /// The credential type the scenario requires.
    pub fn credential_type(self) -> &'static str {
        self.layout().credential_type
    }

    /// The presentation definition of the scenario.
    pub fn definition(self) -> PresentationDefinition {
        let layout = self.layout();

        let fields = std::iter::once(FieldConstraint::equal_to(TYPE_PATH, layout.credential_type))
            .chain(layout.fields.iter().map(|field| {
                FieldConstraint::required(&format!("$.vc.credentialSubject.{field}"))
            }))
            .collect();

        let format = BTreeMap::from([(
            imm_sd_jwt::VC_SD_JWT_FORMAT.to_owned(),
            FormatRequirement {
                alg: Some(ACCEPTED_ALGORITHMS.map(str::to_owned).to_vec()),
            },
        )]);

        PresentationDefinition {
            id: layout.definition_id.to_owned(),
            name: Some(layout.definition_name.to_owned()),
            purpose: Some(layout.purpose.to_owned()),
            input_descriptors: vec![InputDescriptor {
                id: layout.descriptor_id.to_owned(),
                name: Some(layout.descriptor_name.to_owned()),
                purpose: Some(layout.descriptor_purpose.to_owned()),
                format: Some(format),
                constraints: Constraints { fields },
            }],
        }
    }

    fn layout(self) -> Layout {
        match self {
            Self::F1Status => Layout {
                definition_id: "f1-status-verification",
                definition_name: "F-1 Student Status Verification",
                purpose: "Verify that the holder has a valid F-1 student enrollment status",
                descriptor_id: "i20-credential",
                descriptor_name: "I-20 Credential",
                descriptor_purpose: "Proof of enrollment in a U.S. educational institution",
                credential_type: "I20Credential",
                fields: &["programStatus", "institutionName"],
            },
            Self::FinancialSupport => Layout {
                definition_id: "financial-support-verification",
                definition_name: "Financial Support Verification",
                purpose: "Verify that the holder has sufficient financial support for studies",
                descriptor_id: "financial-credential",
                descriptor_name: "Financial Support Credential",
                descriptor_purpose: "Proof of funding for academic expenses",
                credential_type: "FinancialSupportCredential",
                fields: &["totalFunding", "totalExpenses"],
            },
            Self::PassportIdentity => Layout {
                definition_id: "passport-identity-verification",
                definition_name: "Passport Identity Verification",
                purpose: "Verify nationality and passport validity without exposing document number",
                descriptor_id: "passport-credential",
                descriptor_name: "Passport Credential",
                descriptor_purpose:
                    "Verify nationality and passport validity without exposing document number",
                credential_type: "PassportCredential",
                fields: &["nationality", "expirationDate", "holderName"],
            },
            Self::J1Status => Layout {
                definition_id: "j1-status-verification",
                definition_name: "J-1 Exchange Visitor Status Verification",
                purpose: "Verify J-1 exchange visitor status",
                descriptor_id: "ds2019-credential",
                descriptor_name: "DS-2019 Credential",
                descriptor_purpose: "Verify J-1 exchange visitor status",
                credential_type: "DS2019Credential",
                fields: &["programSponsor", "categoryCode", "participantName"],
            },
            Self::AdmissionStatus => Layout {
                definition_id: "admission-status-verification",
                definition_name: "Admission Status Verification",
                purpose: "Verify current admission status and class of admission",
                descriptor_id: "i94-credential",
                descriptor_name: "I-94 Credential",
                descriptor_purpose: "Verify current admission status and class of admission",
                credential_type: "I94Credential",
                fields: &["classOfAdmission", "admittedUntil", "holderName"],
            },
        }
    }
}

/// The listing of every scenario.
pub fn scenarios() -> Vec<ScenarioSummary> {
    Scenario::ALL.into_iter().map(Scenario::summary).collect()
}

#[cfg(test)]
mod tests {
    use imm_sd_jwt::schema::get_schema;
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_id(scenario.id()), Some(scenario));
        }
        assert_eq!(Scenario::from_id("h1b-status"), None);
        assert_eq!(scenarios().len(), 5);
    }

    #[test]
    fn fields_exist_in_the_credential_schema() {
        for scenario in Scenario::ALL {
            let schema = get_schema(scenario.credential_type()).unwrap();
            let definition = scenario.definition();
            let fields = &definition.input_descriptors[0].constraints.fields;

            let type_filter = fields[0].filter.as_ref().unwrap();
            assert_eq!(fields[0].path, ["$.vc.type"]);
            assert_eq!(type_filter.constant.as_deref(), Some(scenario.credential_type()));

            for field in &fields[1..] {
                let claim = field.path[0]
                    .strip_prefix("$.vc.credentialSubject.")
                    .unwrap();
                assert!(schema.is_known_claim(claim), "{claim} of {}", scenario.id());
            }
        }
    }

    #[test]
    fn f1_definition_wire_shape() {
        let definition = serde_json::to_value(Scenario::F1Status.definition()).unwrap();

        assert_eq!(definition["id"], "f1-status-verification");
        assert_eq!(
            definition["input_descriptors"][0]["format"],
            json!({"vc+sd-jwt": {"alg": ["EdDSA", "HS256"]}})
        );
        assert_eq!(
            definition["input_descriptors"][0]["constraints"]["fields"][2],
            json!({"path": ["$.vc.credentialSubject.institutionName"]})
        );
    }
}
