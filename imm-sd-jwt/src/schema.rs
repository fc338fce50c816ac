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

//! The Credential Schema Registry.
//!
//! A fixed, process-wide table of the immigration credential types the
//! issuer understands. It is built once and never mutated, so lookups need
//! no synchronization.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::JsonObject;

/// The claim layout of one credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSchema {
    /// The type name, also used as the second entry of the VC `type` array.
    #[serde(rename = "type")]
    pub credential_type: &'static str,
    /// Human readable description.
    pub description: &'static str,
    /// Claims that must be present at issuance.
    pub required_claims: &'static [&'static str],
    /// Claims that may be present.
    pub optional_claims: &'static [&'static str],
    /// Claims made selectively disclosable unless the request says otherwise.
    pub default_selective_disclosure: &'static [&'static str],
}

impl CredentialSchema {
    /// The required claims absent from `claims`, in schema order.
    pub fn missing_claims(&self, claims: &JsonObject) -> Vec<&'static str> {
        self.required_claims
            .iter()
            .filter(|name| !claims.contains_key(**name))
            .copied()
            .collect()
    }

    /// Whether `claim` is a required or optional claim of the schema.
    pub fn is_known_claim(&self, claim: &str) -> bool {
        self.required_claims
            .iter()
            .chain(self.optional_claims)
            .any(|name| *name == claim)
    }
}

/// I-20 Certificate of Eligibility for F-1 student status.
pub const I20_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "I20Credential",
    description: "I-20 Certificate of Eligibility for F-1 Student Status",
    required_claims: &[
        "sevisId",
        "studentName",
        "programStatus",
        "educationLevel",
        "primaryMajor",
        "programStartDate",
        "programEndDate",
        "institutionName",
    ],
    optional_claims: &[
        "secondMajor",
        "minor",
        "lengthOfStudy",
        "educationComments",
        "englishProficiencyRequired",
        "englishRequirementsMet",
        "issuanceDate",
        "institutionalKey",
    ],
    default_selective_disclosure: &[
        "sevisId",
        "studentName",
        "programStartDate",
        "programEndDate",
        "issuanceDate",
    ],
};

/// Financial support attestation backing an F-1 application.
pub const FINANCIAL_SUPPORT_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "FinancialSupportCredential",
    description: "Financial Support Attestation for F-1 Student Visa",
    required_claims: &[
        "sevisId",
        "studentName",
        "academicTerm",
        "totalExpenses",
        "totalFunding",
    ],
    optional_claims: &[
        "tuition",
        "livingExpenses",
        "dependentExpenses",
        "otherExpenses",
        "otherExpensesDescription",
        "personalFunds",
        "schoolFunds",
        "schoolFundsDescription",
        "otherFunds",
        "otherFundsDescription",
        "employmentFunds",
        "remarks",
    ],
    default_selective_disclosure: &[
        "sevisId",
        "studentName",
        "personalFunds",
        "schoolFunds",
        "otherFunds",
        "employmentFunds",
        "tuition",
        "livingExpenses",
    ],
};

/// Passport data page, ICAO 9303 MRZ fields.
pub const PASSPORT_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "PassportCredential",
    description: "Passport Identity Document: ICAO 9303 MRZ fields as verifiable claims",
    required_claims: &[
        "holderName",
        "nationality",
        "issuingState",
        "documentNumber",
        "dateOfBirth",
        "expirationDate",
        "sex",
    ],
    optional_claims: &[
        "givenName",
        "surname",
        "passportType",
        "issuanceDate",
        "placeOfBirth",
        "mrzLine1",
        "mrzLine2",
    ],
    default_selective_disclosure: &["documentNumber", "dateOfBirth", "mrzLine1", "mrzLine2"],
};

/// U.S. visa stamp.
pub const VISA_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "VisaCredential",
    description: "U.S. Visa Stamp: visa classification and validity as verifiable claims",
    required_claims: &[
        "holderName",
        "visaType",
        "issuingPost",
        "issueDate",
        "expirationDate",
    ],
    optional_claims: &[
        "stampNumber",
        "controlNumber",
        "entryDate",
        "annotations",
        "numberOfEntries",
        "nationality",
    ],
    default_selective_disclosure: &["stampNumber", "controlNumber", "nationality"],
};

/// DS-2019 Certificate of Eligibility for J-1 exchange visitor status.
pub const DS2019_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "DS2019Credential",
    description: "DS-2019 Certificate of Eligibility for J-1 Exchange Visitor Status",
    required_claims: &[
        "sevisId",
        "participantName",
        "programSponsor",
        "programNumber",
        "categoryCode",
        "programStartDate",
        "programEndDate",
    ],
    optional_claims: &[
        "subjectField",
        "sponsorAddress",
        "officialName",
        "officialTitle",
        "issuanceDate",
    ],
    default_selective_disclosure: &[
        "sevisId",
        "participantName",
        "programStartDate",
        "programEndDate",
    ],
};

/// I-94 Arrival/Departure record.
pub const I94_CREDENTIAL: CredentialSchema = CredentialSchema {
    credential_type: "I94Credential",
    description: "I-94 Arrival/Departure Record: admission status as verifiable claims",
    required_claims: &[
        "holderName",
        "i94Number",
        "classOfAdmission",
        "admissionDate",
        "admittedUntil",
    ],
    optional_claims: &["portOfEntry", "departureDate", "durationOfStatus"],
    default_selective_disclosure: &["i94Number", "holderName"],
};

static SCHEMAS: [CredentialSchema; 6] = [
    I20_CREDENTIAL,
    FINANCIAL_SUPPORT_CREDENTIAL,
    PASSPORT_CREDENTIAL,
    VISA_CREDENTIAL,
    DS2019_CREDENTIAL,
    I94_CREDENTIAL,
];

lazy_static! {
    static ref SCHEMA_INDEX: HashMap<&'static str, &'static CredentialSchema> = SCHEMAS
        .iter()
        .map(|schema| (schema.credential_type, schema))
        .collect();
}

/// Looks up the schema of `credential_type`.
pub fn get_schema(credential_type: &str) -> Option<&'static CredentialSchema> {
    SCHEMA_INDEX.get(credential_type).copied()
}

/// Every registered schema, in registration order.
pub fn all_schemas() -> &'static [CredentialSchema] {
    &SCHEMAS
}

/// Names of all registered credential types, in registration order.
pub fn supported_types() -> impl Iterator<Item = &'static str> {
    SCHEMAS.iter().map(|schema| schema.credential_type)
}
