//! AWS S3 (and S3-compatible) storage provider.
//!
//! Wraps a single `aws_sdk_s3::Client` built from explicit settings:
//! static credentials, endpoint, signing region and addressing style.
//! The client is cheap to share; one instance serves the whole process.

use aws_sdk_s3::config::{Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl, ServerSideEncryption,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use super::backend::{CannedAcl, ObjectStorage, PutObject, RemoteObject};
use crate::config::StorageSettings;
use crate::errors::StorageFault;

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

/// Storage provider backed by the AWS SDK for Rust.
pub struct S3Storage {
    client: Client,
    region: String,
}

impl S3Storage {
    /// Build the SDK client from resolved settings.  No network I/O happens here.
    pub async fn connect(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None, // session_token
            None, // expiry
            "s3file-config",
        );

        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.signing_region.clone()))
            .credentials_provider(credentials);

        if let Some(ref endpoint) = settings.endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.path_style);

        // Streaming checksums force aws-chunked request bodies.
        if settings.disable_chunked_encoding {
            s3_config_builder = s3_config_builder
                .request_checksum_calculation(RequestChecksumCalculation::WhenRequired);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "S3 client initialized: endpoint={} region={} path_style={}",
            settings.endpoint.as_deref().unwrap_or("<default>"),
            settings.signing_region,
            settings.path_style
        );

        Self {
            client,
            region: settings.signing_region.clone(),
        }
    }

    /// Map an SDK error to a fault carrying the provider error code.
    fn map_sdk_error<E>(operation: &'static str, err: E) -> StorageFault
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(str::to_string);
        StorageFault::new(operation, code, DisplayErrorContext(&err).to_string())
    }

    fn sdk_acl(acl: CannedAcl) -> ObjectCannedAcl {
        match acl {
            CannedAcl::Private => ObjectCannedAcl::Private,
            CannedAcl::PublicRead => ObjectCannedAcl::PublicRead,
        }
    }
}

impl ObjectStorage for S3Storage {
    fn put(
        &self,
        request: PutObject,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        Box::pin(async move {
            let PutObject {
                bucket,
                key,
                data,
                metadata,
                acl,
            } = request;

            debug!(
                "S3 put_object: bucket={} key={} acl={}",
                bucket,
                key,
                acl.as_str()
            );

            let mut req = self
                .client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .content_type(&metadata.content_type)
                .cache_control(&metadata.cache_control)
                .acl(Self::sdk_acl(acl))
                .body(ByteStream::from(data));

            if metadata.server_side_encryption {
                req = req.server_side_encryption(ServerSideEncryption::Aes256);
            }
            if let Some(length) = metadata.content_length.and_then(|l| i64::try_from(l).ok()) {
                req = req.content_length(length);
            }

            req.send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

            Ok(())
        })
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RemoteObject>, StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("S3 get_object: bucket={} key={}", bucket, key);

            let resp = match self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key() {
                        return Ok(None);
                    }
                    return Err(Self::map_sdk_error("get_object", service_err));
                }
            };

            let content_type = resp.content_type().map(str::to_string);
            let body_bytes = resp.body.collect().await.map_err(|e| {
                StorageFault::new("get_object", None, format!("reading body: {e}"))
            })?;

            Ok(Some(RemoteObject {
                data: Bytes::from(body_bytes.into_bytes()),
                content_type,
            }))
        })
    }

    fn delete(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("S3 delete_object: bucket={} key={}", bucket, key);

            // S3 delete_object is idempotent -- no error for missing keys.
            self.client
                .delete_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("delete_object", e))?;

            Ok(())
        })
    }

    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("S3 create_bucket: bucket={} region={}", bucket, self.region);

            let mut req = self.client.create_bucket().bucket(&bucket);
            if self.region != DEFAULT_REGION {
                let constraint = CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build();
                req = req.create_bucket_configuration(constraint);
            }

            req.send()
                .await
                .map_err(|e| Self::map_sdk_error("create_bucket", e))?;

            Ok(())
        })
    }
}
