// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sensitive-field upload and domain certificate binding.

use base64::prelude::*;
use serde_json::json;

use crate::client::GraphqlRequest;
use crate::context::RunContext;
use crate::envelope::EncryptedEnvelope;
use crate::error::Result;
use crate::types::SensitiveFieldRef;

use super::{field, optional_field};

/// Name of the sensitive field that holds certificate private keys.
pub const SENSITIVE_FIELD_NAME: &str = "nexusCertificate";

const PUBLIC_KEY_QUERY: &str = r#"query PublicKey($sensitiveFieldName: String!, $profileId: ID!, $region: String!) {
  getPublicKey(
    sensitiveFieldName: $sensitiveFieldName
    profileId: $profileId
    region: $region
  )
}
"#;

const ADD_SENSITIVE_FIELD_MUTATION: &str = r#"mutation addSensitiveField($sensitiveFieldName: String!, $encryptedFieldValue: String!, $encryptedKey: String!, $certificate: String!, $profileId: ID!, $region: String!) {
  addSensitiveField(
    sensitiveFieldName: $sensitiveFieldName
    encryptedFieldValue: $encryptedFieldValue
    encryptedKey: $encryptedKey
    certificate: $certificate
    profileId: $profileId
    region: $region
  ) {
    certificateARNForCloudfront
    certificateArn
    __typename
  }
}
"#;

const UPDATE_DOMAIN_CERTIFICATE_MUTATION: &str = r#"mutation updateDomainCertificate($parameterInput: CertificateUpdateInput, $id: ID!) {
  updateDomainCertificate(parameterInput: $parameterInput, id: $id)
}
"#;

/// Certificate binding for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCertificate<'a> {
    /// Certificate-parameter id of the domain.
    pub parameter_id: &'a str,

    /// Domain without scheme.
    pub domain: &'a str,

    /// Certificate chain in PEM form.
    pub certificate_pem: &'a str,

    /// References returned by [`add_sensitive_field`].
    pub refs: &'a SensitiveFieldRef,

    /// Millisecond timestamp used to name the uploaded files.
    pub uploaded_at_ms: i128,
}

/// Build the public-key lookup for the run's profile.
pub fn public_key_request(ctx: &RunContext) -> GraphqlRequest {
    let profile = ctx.profile();
    GraphqlRequest::new(
        "PublicKey",
        PUBLIC_KEY_QUERY,
        json!({
            "sensitiveFieldName": SENSITIVE_FIELD_NAME,
            "profileId": profile.id,
            "region": profile.region
        }),
    )
}

/// Build the sensitive-field upload.
pub fn add_sensitive_field_request(
    ctx: &RunContext,
    envelope: &EncryptedEnvelope,
    certificate_pem: &str,
) -> GraphqlRequest {
    let profile = ctx.profile();
    GraphqlRequest::new(
        "addSensitiveField",
        ADD_SENSITIVE_FIELD_MUTATION,
        json!({
            "sensitiveFieldName": SENSITIVE_FIELD_NAME,
            "encryptedFieldValue": envelope.iv_and_ciphertext,
            "encryptedKey": envelope.wrapped_symmetric_key,
            "certificate": certificate_pem,
            "profileId": profile.id,
            "region": profile.region
        }),
    )
}

/// Build the domain certificate update.
pub fn update_domain_certificate_request(binding: &DomainCertificate<'_>) -> GraphqlRequest {
    let stem = format!("{}-{}", binding.domain, binding.uploaded_at_ms);
    let certificate_file = format!(
        "data:application/octet-stream;base64,{}",
        BASE64_STANDARD.encode(binding.certificate_pem)
    );

    GraphqlRequest::new(
        "updateDomainCertificate",
        UPDATE_DOMAIN_CERTIFICATE_MUTATION,
        json!({
            "id": binding.parameter_id,
            "parameterInput": {
                "certificateARNForCloudfront": binding.refs.certificate_arn_for_cloudfront,
                "certificateARN": binding.refs.certificate_arn,
                "keyName": format!("{}.key.pem", stem),
                "certificateFile": certificate_file,
                "certificateFileName": format!("{}.crt.pem", stem),
                "isCPManaged": false,
                "uri": binding.domain
            }
        }),
    )
}

/// Fetch the PEM public key that sensitive fields must be wrapped for.
pub async fn public_key(ctx: &RunContext) -> Result<String> {
    let data = ctx.call(&public_key_request(ctx)).await?;
    field(&data, "PublicKey", "getPublicKey")
}

/// Store an encrypted private key together with its certificate.
pub async fn add_sensitive_field(
    ctx: &RunContext,
    envelope: &EncryptedEnvelope,
    certificate_pem: &str,
) -> Result<SensitiveFieldRef> {
    let data = ctx
        .call(&add_sensitive_field_request(ctx, envelope, certificate_pem))
        .await?;
    field(&data, "addSensitiveField", "addSensitiveField")
}

/// Bind an uploaded certificate to a domain's certificate parameter.
pub async fn update_domain_certificate(
    ctx: &RunContext,
    binding: &DomainCertificate<'_>,
) -> Result<bool> {
    let data = ctx.call(&update_domain_certificate_request(binding)).await?;
    Ok(optional_field::<bool>(&data, "updateDomainCertificate")?.unwrap_or(false))
}
