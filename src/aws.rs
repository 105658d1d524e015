// AWS backend: S3 holds the images, DynamoDB holds the tags.
// The SDK is async, the CLI is not, so every call is driven to completion
// on a private current-thread tokio runtime.

use crate::backend::{Backend, Handle, ObjectStorage, TableSpec, TableStore};
use crate::config::{Credentials, DEFAULT_REGION};
use crate::error::{Error, Result};
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::rc::Rc;
use tokio::runtime::Runtime;

/// Name reported by the static credentials provider.
const PROVIDER_NAME: &str = "catsnap";

/// Opens S3 and DynamoDB clients sharing one runtime.
pub struct AwsBackend {
    runtime: Rc<Runtime>,
}

impl AwsBackend {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        Ok(AwsBackend {
            runtime: Rc::new(runtime),
        })
    }
}

/// Turn any SDK error into `Error::Service`, keeping the full error chain.
fn service_error<E>(operation: &'static str) -> impl FnOnce(E) -> Error
where
    E: std::error::Error + 'static,
{
    move |err| Error::service(operation, aws_sdk_s3::error::DisplayErrorContext(&err).to_string())
}

impl Backend for AwsBackend {
    type Storage = S3Storage;
    type Tables = DynamoTables;

    fn connect_storage(&self, credentials: &Credentials, region: &str) -> Result<S3Storage> {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.to_string()))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                PROVIDER_NAME,
            ))
            .build();
        Ok(S3Storage {
            client: aws_sdk_s3::Client::from_conf(config),
            runtime: Rc::clone(&self.runtime),
            region: region.to_string(),
        })
    }

    fn connect_tables(&self, credentials: &Credentials, region: &str) -> Result<DynamoTables> {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new(region.to_string()))
            .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                PROVIDER_NAME,
            ))
            .build();
        Ok(DynamoTables {
            client: aws_sdk_dynamodb::Client::from_conf(config),
            runtime: Rc::clone(&self.runtime),
        })
    }
}

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    runtime: Rc<Runtime>,
    region: String,
}

/// A bucket known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Bucket {
    name: String,
}

impl Handle for S3Bucket {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ObjectStorage for S3Storage {
    type Bucket = S3Bucket;

    fn list_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .runtime
            .block_on(self.client.list_buckets().send())
            .map_err(service_error("ListBuckets"))?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    fn get_bucket(&self, name: &str) -> Result<S3Bucket> {
        self.runtime
            .block_on(self.client.head_bucket().bucket(name).send())
            .map_err(service_error("HeadBucket"))?;
        Ok(S3Bucket {
            name: name.to_string(),
        })
    }

    fn create_bucket(&self, name: &str) -> Result<S3Bucket> {
        let mut request = self.client.create_bucket().bucket(name);
        // us-east-1 rejects an explicit location constraint.
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        self.runtime
            .block_on(request.send())
            .map_err(service_error("CreateBucket"))?;
        Ok(S3Bucket {
            name: name.to_string(),
        })
    }
}

pub struct DynamoTables {
    client: aws_sdk_dynamodb::Client,
    runtime: Rc<Runtime>,
}

/// A table known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoTable {
    name: String,
}

impl Handle for DynamoTable {
    fn name(&self) -> &str {
        &self.name
    }
}

impl TableStore for DynamoTables {
    type Table = DynamoTable;

    fn list_tables(&self) -> Result<Vec<String>> {
        collect_table_pages(|start| {
            let output = self
                .runtime
                .block_on(
                    self.client
                        .list_tables()
                        .set_exclusive_start_table_name(start)
                        .send(),
                )
                .map_err(service_error("ListTables"))?;
            Ok((
                output.table_names().to_vec(),
                output.last_evaluated_table_name().map(str::to_string),
            ))
        })
    }

    fn get_table(&self, name: &str) -> Result<DynamoTable> {
        self.runtime
            .block_on(self.client.describe_table().table_name(name).send())
            .map_err(service_error("DescribeTable"))?;
        Ok(DynamoTable {
            name: name.to_string(),
        })
    }

    fn create_table(&self, name: &str, spec: &TableSpec) -> Result<DynamoTable> {
        let key = KeySchemaElement::builder()
            .attribute_name(spec.hash_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(service_error("CreateTable"))?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(spec.hash_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(service_error("CreateTable"))?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(spec.read_units)
            .write_capacity_units(spec.write_units)
            .build()
            .map_err(service_error("CreateTable"))?;

        let request = self
            .client
            .create_table()
            .table_name(name)
            .key_schema(key)
            .attribute_definitions(attribute)
            .provisioned_throughput(throughput);

        match self.runtime.block_on(request.send()) {
            Ok(_) => Ok(DynamoTable {
                name: name.to_string(),
            }),
            Err(err) => Err(create_table_error(name, err)),
        }
    }
}

/// Follow `ListTables` pages until the service stops returning a
/// continuation name. `fetch` gets the start name and returns one page.
fn collect_table_pages<F>(mut fetch: F) -> Result<Vec<String>>
where
    F: FnMut(Option<String>) -> Result<(Vec<String>, Option<String>)>,
{
    let mut names = Vec::new();
    let mut start = None;
    loop {
        let (page, next) = fetch(start)?;
        names.extend(page);
        match next {
            Some(last) => start = Some(last),
            None => return Ok(names),
        }
    }
}

/// `ResourceInUseException` means the table name is taken; everything else
/// is a plain service failure.
fn create_table_error(name: &str, err: SdkError<CreateTableError, HttpResponse>) -> Error {
    match err.as_service_error() {
        Some(e) if e.is_resource_in_use_exception() => Error::TableExists(name.to_string()),
        _ => service_error("CreateTable")(err),
    }
}
